//! 默认菜单种子数据
//!
//! Inserted once into an empty `menu_item` table.

use super::repository::{RepoResult, menu_item};
use shared::models::MenuItemCreate;
use sqlx::SqlitePool;

/// Category display order
pub const CATEGORY_ORDER: [&str; 6] = [
    "Starter",
    "Main",
    "Dessert",
    "Cocktail",
    "Wine",
    "Non-Alcoholic",
];

const DEFAULT_MENU: &[(&str, &str, f64, &str)] = &[
    ("Truffle Fries", "Crispy fries tossed in truffle oil and parmesan", 8.00, "Starter"),
    ("Buffalo Wings", "Crispy chicken wings tossed in spicy buffalo sauce, served with celery and blue cheese", 12.99, "Starter"),
    ("Ahi Tuna Tartare", "Fresh ahi tuna, avocado, sesame, wonton crisps", 14.00, "Starter"),
    ("Charred Octopus", "Grilled octopus, lemon, smoked paprika aioli", 15.00, "Starter"),
    ("Heirloom Tomato Salad", "Heirloom tomatoes, burrata, basil, olive oil", 12.00, "Starter"),
    ("Sous Vide Ribeye", "12oz ribeye, garlic mash, seasonal veg", 34.00, "Main"),
    ("Miso Glazed Salmon", "Atlantic salmon, miso glaze, jasmine rice", 28.00, "Main"),
    ("Vegan Buddha Bowl", "Quinoa, roasted veg, tahini dressing", 19.00, "Main"),
    ("Lobster Tagliatelle", "Fresh pasta, lobster, tomato cream sauce", 32.00, "Main"),
    ("Molten Chocolate Cake", "Warm chocolate cake, vanilla gelato", 10.00, "Dessert"),
    ("Lemon Tart", "Tangy lemon curd, almond crust, meringue", 9.00, "Dessert"),
    ("Affogato", "Espresso poured over vanilla gelato", 7.00, "Dessert"),
    ("Cucumber Gimlet", "Gin, cucumber, lime, simple syrup", 13.00, "Cocktail"),
    ("Spicy Paloma", "Tequila, grapefruit, lime, chili salt", 13.00, "Cocktail"),
    ("Smoked Old Fashioned", "Bourbon, bitters, smoked orange", 15.00, "Cocktail"),
    ("Chardonnay", "Glass of premium Chardonnay", 11.00, "Wine"),
    ("Pinot Noir", "Glass of premium Pinot Noir", 12.00, "Wine"),
    ("Prosecco", "Glass of sparkling Prosecco", 10.00, "Wine"),
    ("Craft Lemonade", "House-made lemonade, fresh herbs", 5.00, "Non-Alcoholic"),
    ("Cold Brew Coffee", "Iced cold brew, oat milk available", 5.00, "Non-Alcoholic"),
    ("Sparkling Water", "San Pellegrino, 500ml", 4.00, "Non-Alcoholic"),
    ("Herbal Tea", "Selection of premium herbal teas", 4.00, "Non-Alcoholic"),
];

/// Seed the default menu if the table is empty. Returns the number inserted.
pub async fn seed_menu_if_empty(pool: &SqlitePool) -> RepoResult<usize> {
    if menu_item::count(pool).await? > 0 {
        return Ok(0);
    }
    for (name, description, price, category) in DEFAULT_MENU {
        menu_item::create(
            pool,
            MenuItemCreate {
                name: (*name).to_string(),
                description: Some((*description).to_string()),
                price: *price,
                category: (*category).to_string(),
                is_available: Some(true),
            },
        )
        .await?;
    }
    tracing::info!(count = DEFAULT_MENU.len(), "Default menu seeded");
    Ok(DEFAULT_MENU.len())
}
