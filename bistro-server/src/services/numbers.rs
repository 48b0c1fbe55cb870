//! Customer-facing 6-digit number allocation
//!
//! Random numbers are drawn until one is free. The UNIQUE constraint on
//! each table still rejects a concurrent duplicate at insert time.

use shared::util::six_digit_number;
use sqlx::SqlitePool;

use crate::db::repository::{order, reservation};
use crate::utils::{AppError, AppResult, ErrorCode};

const MAX_ATTEMPTS: usize = 50;

pub async fn next_reservation_number(pool: &SqlitePool) -> AppResult<String> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = six_digit_number();
        if !reservation::number_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    tracing::error!("Reservation number space exhausted after {MAX_ATTEMPTS} attempts");
    Err(AppError::new(ErrorCode::ReservationNumberExhausted))
}

pub async fn next_order_number(pool: &SqlitePool) -> AppResult<String> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = six_digit_number();
        if !order::number_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    tracing::error!("Order number space exhausted after {MAX_ATTEMPTS} attempts");
    Err(AppError::with_message(
        ErrorCode::ReservationNumberExhausted,
        "Could not allocate a unique order number",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[tokio::test]
    async fn test_numbers_are_six_digits() {
        let db = DbService::in_memory().await.unwrap();
        let r = next_reservation_number(&db.pool).await.unwrap();
        let o = next_order_number(&db.pool).await.unwrap();
        assert_eq!(r.len(), 6);
        assert_eq!(o.len(), 6);
        assert!(r.chars().all(|c| c.is_ascii_digit()));
    }
}
