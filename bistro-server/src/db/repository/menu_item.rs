//! Menu Item Repository

use super::{RepoError, RepoResult};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::util::snowflake_id;
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, description, price, category, is_available";

/// All items ordered by category then name
pub async fn find_all(pool: &SqlitePool, include_unavailable: bool) -> RepoResult<Vec<MenuItem>> {
    let sql = if include_unavailable {
        format!("SELECT {COLUMNS} FROM menu_item ORDER BY category, name")
    } else {
        format!("SELECT {COLUMNS} FROM menu_item WHERE is_available = 1 ORDER BY category, name")
    };
    let items = sqlx::query_as::<_, MenuItem>(&sql).fetch_all(pool).await?;
    Ok(items)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let item = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_item WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

/// Case-insensitive exact name lookup
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<MenuItem>> {
    let item = sqlx::query_as::<_, MenuItem>(&format!(
        "SELECT {COLUMNS} FROM menu_item WHERE name = ? COLLATE NOCASE LIMIT 1"
    ))
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_item")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, data: MenuItemCreate) -> RepoResult<MenuItem> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO menu_item (id, name, description, price, category, is_available)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category.trim())
    .bind(data.is_available.unwrap_or(true))
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create menu item".into()))
}

/// Partial update. Existing `order_item.price_at_time` rows are never touched.
pub async fn update(pool: &SqlitePool, id: i64, data: MenuItemUpdate) -> RepoResult<MenuItem> {
    let rows = sqlx::query(
        "UPDATE menu_item SET
            name = COALESCE(?1, name),
            description = COALESCE(?2, description),
            price = COALESCE(?3, price),
            category = COALESCE(?4, category),
            is_available = COALESCE(?5, is_available)
         WHERE id = ?6",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category.as_deref().map(str::trim))
    .bind(data.is_available)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Menu item {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Menu item {id} not found")))
}

/// Soft delete: the row stays so historic order items keep their name
pub async fn set_available(pool: &SqlitePool, id: i64, available: bool) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE menu_item SET is_available = ? WHERE id = ?")
        .bind(available)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn item(name: &str, price: f64) -> MenuItemCreate {
        MenuItemCreate {
            name: name.into(),
            description: None,
            price,
            category: "Starter".into(),
            is_available: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_case_insensitive() {
        let db = DbService::in_memory().await.unwrap();
        let created = create(&db.pool, item("Truffle Fries", 8.0)).await.unwrap();
        assert!(created.is_available);

        let found = find_by_name(&db.pool, "truffle FRIES").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = DbService::in_memory().await.unwrap();
        create(&db.pool, item("Affogato", 7.0)).await.unwrap();
        let err = create(&db.pool, item("affogato", 7.0)).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_default_listing() {
        let db = DbService::in_memory().await.unwrap();
        let a = create(&db.pool, item("Lemon Tart", 9.0)).await.unwrap();
        create(&db.pool, item("Affogato", 7.0)).await.unwrap();

        assert!(set_available(&db.pool, a.id, false).await.unwrap());
        assert_eq!(find_all(&db.pool, false).await.unwrap().len(), 1);
        assert_eq!(find_all(&db.pool, true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = DbService::in_memory().await.unwrap();
        let err = update(&db.pool, 42, MenuItemUpdate::default()).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
