//! Order Repository
//!
//! Standalone pickup/delivery orders and reservation party orders share the
//! `orders` table; line items live in `order_item`.

use super::RepoResult;
use shared::models::{Order, OrderItem, OrderQuery, OrderStatus, OrderType};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, order_number, order_type, status, reservation_id, person_name, \
    customer_phone, customer_address, target_date, target_time, special_instructions, \
    total_amount, payment_status, payment_intent_id, payment_amount, payment_date, \
    confirmation_number, created_at, updated_at";

const ITEM_SELECT: &str = "SELECT oi.id, oi.order_id, oi.menu_item_id, m.name AS menu_item_name, \
    oi.quantity, oi.price_at_time, oi.notes \
    FROM order_item oi JOIN menu_item m ON m.id = oi.menu_item_id";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(&format!("SELECT {COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Exact match on the 6-digit number
pub async fn find_by_number(pool: &SqlitePool, number: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE order_number = ?"
    ))
    .bind(number)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn number_exists(pool: &SqlitePool, number: &str) -> RepoResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = ?)")
            .bind(number)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

pub async fn find_by_intent_id(
    pool: &SqlitePool,
    payment_intent_id: &str,
) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE payment_intent_id = ? AND order_type != 'reservation' LIMIT 1"
    ))
    .bind(payment_intent_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Most recent standalone order placed from a phone number
pub async fn find_latest_by_phone(pool: &SqlitePool, phone: &str) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders
         WHERE customer_phone = ? AND order_type != 'reservation'
         ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Party orders of one reservation, oldest first
pub async fn find_by_reservation(pool: &SqlitePool, reservation_id: i64) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE reservation_id = ? ORDER BY created_at, id"
    ))
    .bind(reservation_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_all(pool: &SqlitePool, query: &OrderQuery) -> RepoResult<Vec<Order>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM orders WHERE 1 = 1"));
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(order_type) = query.order_type {
        qb.push(" AND order_type = ").push_bind(order_type);
    }
    if let Some(date) = &query.date {
        qb.push(" AND target_date = ").push_bind(date.clone());
    }
    if let Some(phone) = &query.phone {
        qb.push(" AND customer_phone = ").push_bind(phone.clone());
    }
    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build_query_as::<Order>().fetch_all(pool).await?;
    Ok(rows)
}

/// Active orders for one date, optionally within `[start, end]` (HH:MM)
///
/// Party orders take their date/time from the reservation.
pub async fn find_for_kitchen(
    pool: &SqlitePool,
    date: &str,
    start_time: Option<&str>,
    end_time: Option<&str>,
) -> RepoResult<Vec<Order>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {} FROM orders o LEFT JOIN reservation r ON r.id = o.reservation_id
         WHERE o.status IN ('pending', 'preparing', 'ready')
           AND (r.id IS NULL OR r.status = 'confirmed')
           AND COALESCE(r.date, o.target_date) = ",
        prefixed_columns("o")
    ));
    qb.push_bind(date.to_string());
    if let Some(start) = start_time {
        qb.push(" AND COALESCE(r.time, o.target_time) >= ")
            .push_bind(start.to_string());
    }
    if let Some(end) = end_time {
        qb.push(" AND COALESCE(r.time, o.target_time) <= ")
            .push_bind(end.to_string());
    }
    qb.push(" ORDER BY COALESCE(r.time, o.target_time), o.created_at");

    let rows = qb.build_query_as::<Order>().fetch_all(pool).await?;
    Ok(rows)
}

fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(&format!(
        "{ITEM_SELECT} WHERE oi.order_id = ? ORDER BY oi.id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert(conn: &mut SqliteConnection, o: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, order_type, status, reservation_id, person_name,
            customer_phone, customer_address, target_date, target_time, special_instructions,
            total_amount, payment_status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(o.id)
    .bind(&o.order_number)
    .bind(o.order_type)
    .bind(o.status)
    .bind(o.reservation_id)
    .bind(&o.person_name)
    .bind(&o.customer_phone)
    .bind(&o.customer_address)
    .bind(&o.target_date)
    .bind(&o.target_time)
    .bind(&o.special_instructions)
    .bind(o.total_amount)
    .bind(o.payment_status)
    .bind(o.created_at)
    .bind(o.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Insert a line; `price_at_time` is fixed from here on
pub async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_item (id, order_id, menu_item_id, quantity, price_at_time, notes)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.menu_item_id)
    .bind(item.quantity)
    .bind(item.price_at_time)
    .bind(&item.notes)
    .execute(conn)
    .await?;
    Ok(())
}

/// Drop every party order of a reservation (items cascade)
pub async fn delete_by_reservation(
    conn: &mut SqliteConnection,
    reservation_id: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM orders WHERE reservation_id = ? AND order_type = ?")
        .bind(reservation_id)
        .bind(OrderType::Reservation)
        .execute(conn)
        .await?;
    Ok(rows.rows_affected())
}

/// Guarded status change; `false` when the row was no longer in `from`
pub async fn transition_status(
    pool: &SqlitePool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows =
        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(to)
            .bind(now)
            .bind(id)
            .bind(from)
            .execute(pool)
            .await?;
    Ok(rows.rows_affected() > 0)
}

/// unpaid → paid, never for a cancelled order
pub async fn mark_paid(
    pool: &SqlitePool,
    id: i64,
    payment_intent_id: &str,
    amount: f64,
    confirmation_number: &str,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = 'paid', payment_intent_id = ?,
            payment_amount = ?, payment_date = ?, confirmation_number = ?, updated_at = ?
         WHERE id = ? AND payment_status = 'unpaid' AND status != 'cancelled'",
    )
    .bind(payment_intent_id)
    .bind(amount)
    .bind(now)
    .bind(confirmation_number)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Mark the party orders of a reservation paid alongside it
pub async fn mark_party_orders_paid(
    conn: &mut SqliteConnection,
    reservation_id: i64,
    now: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = 'paid', payment_date = ?, updated_at = ?
         WHERE reservation_id = ? AND payment_status = 'unpaid' AND status != 'cancelled'",
    )
    .bind(now)
    .bind(now)
    .bind(reservation_id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn set_payment_intent(
    pool: &SqlitePool,
    id: i64,
    payment_intent_id: &str,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE orders SET payment_intent_id = ?, updated_at = ?
         WHERE id = ? AND payment_status = 'unpaid'",
    )
    .bind(payment_intent_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
