//! get_menu

use crate::core::ServerState;
use crate::voice::skills::SkillResult;
use crate::voice::swaig::{Args, FunctionResult};

pub async fn get_menu(state: &ServerState, args: &Args) -> SkillResult {
    let category = args.str("category");
    let groups = state.menu.grouped(category.as_deref()).await?;

    if groups.is_empty() {
        let all = state.menu.grouped(None).await?;
        let names: Vec<&str> = all.iter().map(|g| g.category.as_str()).collect();
        let response = match category {
            Some(c) => format!(
                "We don't have a {c} section. Our menu has {}.",
                names.join(", ")
            ),
            None => "Our menu is being updated right now. Please check back soon.".to_string(),
        };
        return Ok(FunctionResult::new(response));
    }

    if args.wants_json() {
        let text = serde_json::to_string(&groups).unwrap_or_default();
        return Ok(FunctionResult::new(text).add_action("menu_data", &groups));
    }

    let sections: Vec<String> = groups
        .iter()
        .map(|g| {
            let items: Vec<String> = g
                .items
                .iter()
                .map(|i| format!("{} (${:.2})", i.name, i.price))
                .collect();
            format!("{}: {}", g.category, items.join(", "))
        })
        .collect();
    let response = format!("Here's our menu. {}.", sections.join(". "));
    Ok(FunctionResult::new(response).add_action("menu_data", &groups))
}
