//! Menu Service

use shared::error::ErrorCode;
use shared::models::{MenuCategory, MenuItem, MenuItemCreate, MenuItemUpdate};
use sqlx::SqlitePool;

use crate::db::repository::{RepoError, menu_item};
use crate::db::seed::CATEGORY_ORDER;
use crate::services::menu_match::find_best_match;
use crate::services::money::validate_price;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN};
use crate::utils::validation::{validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct MenuService {
    pool: SqlitePool,
}

impl MenuService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, include_unavailable: bool) -> AppResult<Vec<MenuItem>> {
        Ok(menu_item::find_all(&self.pool, include_unavailable).await?)
    }

    /// Available items grouped by category, known categories first
    pub async fn grouped(&self, category: Option<&str>) -> AppResult<Vec<MenuCategory>> {
        let items = self.list(false).await?;
        Ok(group_by_category(items, category))
    }

    pub async fn get(&self, id: i64) -> AppResult<MenuItem> {
        menu_item::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::with_message(ErrorCode::MenuItemNotFound, format!("Menu item {id} not found")))
    }

    /// Resolve an orderable item by id
    pub async fn orderable_by_id(&self, id: i64) -> AppResult<MenuItem> {
        let item = self.get(id).await?;
        if !item.is_available {
            return Err(AppError::with_message(
                ErrorCode::MenuItemUnavailable,
                format!("{} is not available", item.name),
            ));
        }
        Ok(item)
    }

    /// Resolve an orderable item by spoken/typed name (fuzzy)
    pub async fn orderable_by_name(&self, name: &str) -> AppResult<MenuItem> {
        let items = self.list(false).await?;
        find_best_match(name, &items).cloned().ok_or_else(|| {
            AppError::with_message(
                ErrorCode::MenuItemNotFound,
                format!("No menu item matches '{name}'"),
            )
            .with_detail("name", name)
        })
    }

    pub async fn create(&self, data: MenuItemCreate) -> AppResult<MenuItem> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&data.category, "category", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
        validate_price(data.price)?;

        let item = menu_item::create(&self.pool, data)
            .await
            .map_err(name_conflict)?;
        tracing::info!(menu_item_id = item.id, name = %item.name, "Menu item created");
        Ok(item)
    }

    /// Price changes only affect lines created afterwards
    pub async fn update(&self, id: i64, data: MenuItemUpdate) -> AppResult<MenuItem> {
        if let Some(name) = &data.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        if let Some(category) = &data.category {
            validate_required_text(category, "category", MAX_SHORT_TEXT_LEN)?;
        }
        validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
        if let Some(price) = data.price {
            validate_price(price)?;
        }

        let item = menu_item::update(&self.pool, id, data)
            .await
            .map_err(|e| match e {
                RepoError::NotFound(msg) => AppError::with_message(ErrorCode::MenuItemNotFound, msg),
                other => name_conflict(other),
            })?;
        tracing::info!(menu_item_id = id, "Menu item updated");
        Ok(item)
    }

    /// Soft delete
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !menu_item::set_available(&self.pool, id, false).await? {
            return Err(AppError::with_message(
                ErrorCode::MenuItemNotFound,
                format!("Menu item {id} not found"),
            ));
        }
        tracing::info!(menu_item_id = id, "Menu item marked unavailable");
        Ok(())
    }
}

fn name_conflict(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::MenuItemNameExists),
        other => other.into(),
    }
}

/// Group in display order; unknown categories follow alphabetically
pub fn group_by_category(items: Vec<MenuItem>, only: Option<&str>) -> Vec<MenuCategory> {
    let mut groups: Vec<MenuCategory> = Vec::new();
    for item in items {
        if only.is_some_and(|c| !c.eq_ignore_ascii_case(&item.category)) {
            continue;
        }
        match groups.iter_mut().find(|g| g.category == item.category) {
            Some(group) => group.items.push(item),
            None => groups.push(MenuCategory {
                category: item.category.clone(),
                items: vec![item],
            }),
        }
    }
    groups.sort_by_key(|g| {
        let rank = CATEGORY_ORDER
            .iter()
            .position(|c| *c == g.category)
            .unwrap_or(CATEGORY_ORDER.len());
        (rank, g.category.clone())
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::seed::seed_menu_if_empty;

    async fn service() -> MenuService {
        let db = DbService::in_memory().await.unwrap();
        seed_menu_if_empty(&db.pool).await.unwrap();
        MenuService::new(db.pool)
    }

    #[tokio::test]
    async fn test_grouped_in_display_order() {
        let menu = service().await;
        let groups = menu.grouped(None).await.unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, CATEGORY_ORDER.to_vec());

        let wine = menu.grouped(Some("wine")).await.unwrap();
        assert_eq!(wine.len(), 1);
        assert_eq!(wine[0].items.len(), 3);
    }

    #[tokio::test]
    async fn test_fuzzy_lookup_and_soft_delete() {
        let menu = service().await;
        let wings = menu.orderable_by_name("chicken wings").await.unwrap();
        assert_eq!(wings.name, "Buffalo Wings");

        menu.delete(wings.id).await.unwrap();
        let err = menu.orderable_by_id(wings.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemUnavailable);
        assert!(menu.list(true).await.unwrap().iter().any(|m| m.id == wings.id));
    }

    #[tokio::test]
    async fn test_create_validates_and_rejects_duplicates() {
        let menu = service().await;
        let bad = MenuItemCreate {
            name: "Free Lunch".into(),
            description: None,
            price: -1.0,
            category: "Main".into(),
            is_available: None,
        };
        assert_eq!(
            menu.create(bad).await.unwrap_err().code,
            ErrorCode::MenuItemInvalidPrice
        );

        let dup = MenuItemCreate {
            name: "affogato".into(),
            description: None,
            price: 7.0,
            category: "Dessert".into(),
            is_available: None,
        };
        assert_eq!(
            menu.create(dup).await.unwrap_err().code,
            ErrorCode::MenuItemNameExists
        );
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let menu = service().await;
        let err = menu.update(1, MenuItemUpdate::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::MenuItemNotFound);
    }
}
