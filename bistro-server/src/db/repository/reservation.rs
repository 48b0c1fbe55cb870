//! Reservation Repository

use super::{RepoError, RepoResult};
use shared::models::{Reservation, ReservationQuery, ReservationStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, reservation_number, name, phone_number, party_size, date, time, \
    status, payment_status, special_requests, meta_data, payment_intent_id, payment_amount, \
    payment_date, confirmation_number, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservation WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Exact match on the 6-digit number
pub async fn find_by_number(pool: &SqlitePool, number: &str) -> RepoResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservation WHERE reservation_number = ?"
    ))
    .bind(number)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn number_exists(pool: &SqlitePool, number: &str) -> RepoResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reservation WHERE reservation_number = ?)")
            .bind(number)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

pub async fn find_by_intent_id(
    pool: &SqlitePool,
    payment_intent_id: &str,
) -> RepoResult<Option<Reservation>> {
    let row = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservation WHERE payment_intent_id = ? LIMIT 1"
    ))
    .bind(payment_intent_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Filtered listing ordered by date, time
///
/// `search` matches name, phone number or reservation number (substring).
pub async fn find_all(pool: &SqlitePool, query: &ReservationQuery) -> RepoResult<Vec<Reservation>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM reservation WHERE 1 = 1"));

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        qb.push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone_number LIKE ")
            .push_bind(pattern.clone())
            .push(" OR reservation_number LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(date) = &query.date {
        qb.push(" AND date = ").push_bind(date.clone());
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    qb.push(" ORDER BY date, time");

    let rows = qb.build_query_as::<Reservation>().fetch_all(pool).await?;
    Ok(rows)
}

/// Newest booking first
pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> RepoResult<Vec<Reservation>> {
    let rows = sqlx::query_as::<_, Reservation>(&format!(
        "SELECT {COLUMNS} FROM reservation WHERE phone_number = ? ORDER BY date DESC, time DESC"
    ))
    .bind(phone)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert(conn: &mut SqliteConnection, r: &Reservation) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO reservation (id, reservation_number, name, phone_number, party_size, date,
            time, status, payment_status, special_requests, meta_data, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(r.id)
    .bind(&r.reservation_number)
    .bind(&r.name)
    .bind(&r.phone_number)
    .bind(r.party_size)
    .bind(&r.date)
    .bind(&r.time)
    .bind(r.status)
    .bind(r.payment_status)
    .bind(&r.special_requests)
    .bind(r.meta_data.to_string())
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Write back the editable fields of a confirmed reservation
pub async fn update_details(conn: &mut SqliteConnection, r: &Reservation) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE reservation SET name = ?, phone_number = ?, party_size = ?, date = ?, time = ?,
            special_requests = ?, meta_data = ?, updated_at = ?
         WHERE id = ? AND status = 'confirmed'",
    )
    .bind(&r.name)
    .bind(&r.phone_number)
    .bind(r.party_size)
    .bind(&r.date)
    .bind(&r.time)
    .bind(&r.special_requests)
    .bind(r.meta_data.to_string())
    .bind(r.updated_at)
    .bind(r.id)
    .execute(conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Confirmed reservation {} not found",
            r.id
        )));
    }
    Ok(())
}

/// Guarded status change; `false` when the row was not in `from`
pub async fn transition_status(
    pool: &SqlitePool,
    id: i64,
    from: ReservationStatus,
    to: ReservationStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE reservation SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(to)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// unpaid → paid, only for a confirmed reservation
///
/// Returns `false` if another writer got there first.
pub async fn mark_paid(
    conn: &mut SqliteConnection,
    id: i64,
    payment_intent_id: &str,
    amount: f64,
    confirmation_number: &str,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE reservation SET payment_status = 'paid', payment_intent_id = ?,
            payment_amount = ?, payment_date = ?, confirmation_number = ?, updated_at = ?
         WHERE id = ? AND payment_status = 'unpaid' AND status = 'confirmed'",
    )
    .bind(payment_intent_id)
    .bind(amount)
    .bind(now)
    .bind(confirmation_number)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Remember the gateway intent so its webhook can find this row
pub async fn set_payment_intent(
    pool: &SqlitePool,
    id: i64,
    payment_intent_id: &str,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE reservation SET payment_intent_id = ?, updated_at = ?
         WHERE id = ? AND payment_status = 'unpaid'",
    )
    .bind(payment_intent_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Hard delete; party orders and their items cascade
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM reservation WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// `(price_at_time, quantity)` of every item in the non-cancelled party orders
pub async fn bill_lines(pool: &SqlitePool, reservation_id: i64) -> RepoResult<Vec<(f64, i32)>> {
    let rows: Vec<(f64, i32)> = sqlx::query_as(
        "SELECT oi.price_at_time, oi.quantity
         FROM order_item oi
         JOIN orders o ON o.id = oi.order_id
         WHERE o.reservation_id = ? AND o.status != 'cancelled'",
    )
    .bind(reservation_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::PaymentStatus;
    use shared::util::{now_millis, snowflake_id};

    fn reservation(number: &str, name: &str, date: &str) -> Reservation {
        let now = now_millis();
        Reservation {
            id: snowflake_id(),
            reservation_number: number.into(),
            name: name.into(),
            phone_number: "+15551234567".into(),
            party_size: 2,
            date: date.into(),
            time: "19:00".into(),
            status: ReservationStatus::Confirmed,
            payment_status: PaymentStatus::Unpaid,
            special_requests: None,
            meta_data: serde_json::json!({"source": "test"}),
            payment_intent_id: None,
            payment_amount: None,
            payment_date: None,
            confirmation_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn insert_one(db: &DbService, r: &Reservation) {
        let mut conn = db.pool.acquire().await.unwrap();
        insert(&mut conn, r).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_number_is_exact() {
        let db = DbService::in_memory().await.unwrap();
        insert_one(&db, &reservation("123456", "Ann", "2030-01-01")).await;
        insert_one(&db, &reservation("234567", "Bob", "2030-01-01")).await;

        let found = find_by_number(&db.pool, "234567").await.unwrap().unwrap();
        assert_eq!(found.name, "Bob");
        assert_eq!(found.meta_data["source"], "test");
        assert!(find_by_number(&db.pool, "23456").await.unwrap().is_none());
        assert!(number_exists(&db.pool, "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_and_order() {
        let db = DbService::in_memory().await.unwrap();
        insert_one(&db, &reservation("111111", "Zoe Smith", "2030-01-02")).await;
        insert_one(&db, &reservation("222222", "Adam Smith", "2030-01-01")).await;
        insert_one(&db, &reservation("333333", "Carl Jones", "2030-01-01")).await;

        let query = ReservationQuery {
            search: Some("smith".into()),
            ..Default::default()
        };
        let rows = find_all(&db.pool, &query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reservation_number, "222222");

        let query = ReservationQuery {
            search: Some("3333".into()),
            ..Default::default()
        };
        assert_eq!(find_all(&db.pool, &query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_paid_is_guarded() {
        let db = DbService::in_memory().await.unwrap();
        let r = reservation("444444", "Ann", "2030-01-01");
        insert_one(&db, &r).await;

        assert!(mark_paid(&mut *db.pool.acquire().await.unwrap(), r.id, "pi_1", 20.0, "CONF-00000001", 1).await.unwrap());
        assert!(!mark_paid(&mut *db.pool.acquire().await.unwrap(), r.id, "pi_2", 20.0, "CONF-00000002", 2).await.unwrap());

        let paid = find_by_id(&db.pool, r.id).await.unwrap().unwrap();
        assert_eq!(paid.payment_intent_id.as_deref(), Some("pi_1"));
        assert_eq!(paid.confirmation_number.as_deref(), Some("CONF-00000001"));
    }

    #[tokio::test]
    async fn test_cancel_transition_is_one_way() {
        let db = DbService::in_memory().await.unwrap();
        let r = reservation("555555", "Ann", "2030-01-01");
        insert_one(&db, &r).await;

        use ReservationStatus::*;
        assert!(transition_status(&db.pool, r.id, Confirmed, Cancelled, 1).await.unwrap());
        assert!(!transition_status(&db.pool, r.id, Confirmed, Cancelled, 2).await.unwrap());
        assert!(!mark_paid(&mut *db.pool.acquire().await.unwrap(), r.id, "pi", 1.0, "CONF-1", 3).await.unwrap());
    }
}
