//! Reservation Service
//!
//! Booking CRUD, party orders, bill aggregation and the calendar feed.
//!
//! # 状态规则
//!
//! - `confirmed → cancelled`，取消后不可再修改、加单或支付
//! - 已支付的预订不能替换或追加 party orders (会重新计费)
//! - 账单总额始终由 order_item 行实时计算

use serde_json::Value;
use shared::error::ErrorCode;
use shared::models::{
    CalendarEvent, CalendarEventProps, Order, OrderStatus, OrderType, PartyOrderInput,
    PaymentStatus, Reservation, ReservationCreate, ReservationDetail, ReservationQuery,
    ReservationStatus, ReservationUpdate,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use crate::db::repository::{order, reservation};
use crate::services::menu_service::MenuService;
use crate::services::money::sum_lines;
use crate::services::numbers::next_reservation_number;
use crate::services::order_service::{
    OrderService, PricedLine, db_err, insert_with_lines, lines_total, resolve_lines,
};
use crate::utils::phone::require_phone;
use crate::utils::time::iso_local;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_date, validate_optional_text, validate_party_size,
    validate_required_text, validate_time,
};
use crate::utils::{AppError, AppResult};

/// Calendar slot length
const SLOT_HOURS: i64 = 2;

#[derive(Clone, Debug)]
pub struct ReservationService {
    pool: SqlitePool,
    menu: MenuService,
    orders: OrderService,
}

impl ReservationService {
    pub fn new(pool: SqlitePool, menu: MenuService, orders: OrderService) -> Self {
        Self { pool, menu, orders }
    }

    /// Book a table, with optional party pre-orders, in one transaction
    pub async fn create(&self, data: ReservationCreate) -> AppResult<ReservationDetail> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
        let phone = require_phone(&data.phone_number, "phone_number")?;
        validate_party_size(data.party_size)?;
        validate_date(&data.date)?;
        validate_time(&data.time)?;
        validate_optional_text(&data.special_requests, "special_requests", MAX_NOTE_LEN)?;
        let party = self.resolve_party(&data.party_orders).await?;

        let now = now_millis();
        let r = Reservation {
            id: snowflake_id(),
            reservation_number: next_reservation_number(&self.pool).await?,
            name: data.name.trim().to_string(),
            phone_number: phone,
            party_size: data.party_size,
            date: data.date,
            time: data.time,
            status: ReservationStatus::Confirmed,
            payment_status: PaymentStatus::Unpaid,
            special_requests: data.special_requests.filter(|s| !s.trim().is_empty()),
            meta_data: data.meta_data.unwrap_or_else(|| Value::Object(Default::default())),
            payment_intent_id: None,
            payment_amount: None,
            payment_date: None,
            confirmation_number: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        reservation::insert(&mut tx, &r).await?;
        for (person, lines) in &party {
            insert_with_lines(&mut tx, &party_order(&r, person, lines, now), lines).await?;
        }
        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            reservation_number = %r.reservation_number,
            party_size = r.party_size,
            party_orders = party.len(),
            "Reservation created"
        );
        self.get(r.id).await
    }

    /// Reservation with party orders and recomputed bill
    pub async fn get(&self, id: i64) -> AppResult<ReservationDetail> {
        let r = self.load(id).await?;
        self.detail(r).await
    }

    /// Exact 6-digit lookup
    pub async fn find_by_number(&self, number: &str) -> AppResult<ReservationDetail> {
        let r = reservation::find_by_number(&self.pool, number.trim())
            .await?
            .ok_or_else(|| not_found(number))?;
        self.detail(r).await
    }

    pub async fn list(&self, query: &ReservationQuery) -> AppResult<Vec<Reservation>> {
        Ok(reservation::find_all(&self.pool, query).await?)
    }

    /// Confirmed bookings on one date, by time
    pub async fn for_date(&self, date: &str) -> AppResult<Vec<Reservation>> {
        validate_date(date)?;
        let query = ReservationQuery {
            date: Some(date.to_string()),
            status: Some(ReservationStatus::Confirmed),
            ..Default::default()
        };
        self.list(&query).await
    }

    /// Newest first
    pub async fn for_phone(&self, phone: &str) -> AppResult<Vec<Reservation>> {
        Ok(reservation::find_by_phone(&self.pool, phone).await?)
    }

    /// Partial update; `party_orders` replaces the existing party orders
    pub async fn update(&self, id: i64, data: ReservationUpdate) -> AppResult<ReservationDetail> {
        let mut r = self.load(id).await?;
        ensure_open(&r)?;
        if data.party_orders.is_some() && r.is_paid() {
            return Err(paid_error(&r));
        }

        if let Some(name) = data.name {
            validate_required_text(&name, "name", MAX_NAME_LEN)?;
            r.name = name.trim().to_string();
        }
        if let Some(phone) = data.phone_number {
            r.phone_number = require_phone(&phone, "phone_number")?;
        }
        if let Some(size) = data.party_size {
            validate_party_size(size)?;
            r.party_size = size;
        }
        if let Some(date) = data.date {
            validate_date(&date)?;
            r.date = date;
        }
        if let Some(time) = data.time {
            validate_time(&time)?;
            r.time = time;
        }
        if data.special_requests.is_some() {
            validate_optional_text(&data.special_requests, "special_requests", MAX_NOTE_LEN)?;
            r.special_requests = data.special_requests.filter(|s| !s.trim().is_empty());
        }
        if let Some(meta) = data.meta_data {
            r.meta_data = meta;
        }
        let party = match &data.party_orders {
            Some(inputs) => Some(self.resolve_party(inputs).await?),
            None => None,
        };

        let now = now_millis();
        r.updated_at = now;
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        reservation::update_details(&mut tx, &r).await?;
        if let Some(party) = &party {
            order::delete_by_reservation(&mut tx, r.id).await?;
            for (person, lines) in party {
                insert_with_lines(&mut tx, &party_order(&r, person, lines, now), lines).await?;
            }
        }
        tx.commit().await.map_err(db_err)?;

        tracing::info!(reservation_number = %r.reservation_number, "Reservation updated");
        self.get(id).await
    }

    /// confirmed → cancelled; a second cancel is an error
    pub async fn cancel(&self, id: i64) -> AppResult<ReservationDetail> {
        let r = self.load(id).await?;
        if !r.status.can_transition_to(ReservationStatus::Cancelled) {
            return Err(AppError::new(ErrorCode::ReservationAlreadyCancelled)
                .with_detail("reservation_number", r.reservation_number.clone()));
        }
        let changed = reservation::transition_status(
            &self.pool,
            id,
            ReservationStatus::Confirmed,
            ReservationStatus::Cancelled,
            now_millis(),
        )
        .await?;
        if !changed {
            return Err(AppError::new(ErrorCode::ReservationAlreadyCancelled));
        }
        tracing::info!(reservation_number = %r.reservation_number, "Reservation cancelled");
        self.get(id).await
    }

    /// Append one party member's pre-order
    pub async fn add_party_order(
        &self,
        id: i64,
        input: PartyOrderInput,
    ) -> AppResult<ReservationDetail> {
        let r = self.load(id).await?;
        ensure_open(&r)?;
        if r.is_paid() {
            return Err(paid_error(&r));
        }
        let party = self.resolve_party(std::slice::from_ref(&input)).await?;

        let now = now_millis();
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for (person, lines) in &party {
            insert_with_lines(&mut tx, &party_order(&r, person, lines, now), lines).await?;
        }
        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            reservation_number = %r.reservation_number,
            person = %input.person_name,
            "Party order added"
        );
        self.get(id).await
    }

    /// Admin hard delete
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !reservation::delete(&self.pool, id).await? {
            return Err(not_found(&id.to_string()));
        }
        tracing::warn!(reservation_id = id, "Reservation deleted");
        Ok(())
    }

    /// Σ price_at_time × quantity over the party orders
    pub async fn bill_total(&self, id: i64) -> AppResult<f64> {
        let lines = reservation::bill_lines(&self.pool, id).await?;
        Ok(sum_lines(lines))
    }

    /// Calendar feed for an optional date range (inclusive)
    pub async fn calendar(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> AppResult<Vec<CalendarEvent>> {
        for d in [start, end].into_iter().flatten() {
            validate_date(d)?;
        }
        let rows = self.list(&ReservationQuery::default()).await?;
        let mut events = Vec::with_capacity(rows.len());
        for r in rows {
            if start.is_some_and(|s| r.date.as_str() < s) || end.is_some_and(|e| r.date.as_str() > e) {
                continue;
            }
            events.push(CalendarEvent {
                id: r.id,
                title: format!("{} ({})", r.name, r.party_size),
                start: iso_local(&r.date, &r.time, 0)?,
                end: iso_local(&r.date, &r.time, SLOT_HOURS)?,
                extended_props: CalendarEventProps {
                    reservation_number: r.reservation_number,
                    party_size: r.party_size,
                    phone_number: r.phone_number,
                    status: r.status,
                    payment_status: r.payment_status,
                    special_requests: r.special_requests,
                },
            });
        }
        Ok(events)
    }

    async fn load(&self, id: i64) -> AppResult<Reservation> {
        reservation::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))
    }

    async fn detail(&self, r: Reservation) -> AppResult<ReservationDetail> {
        let party_orders = self.orders.for_reservation(r.id).await?;
        let bill_total = sum_lines(
            party_orders
                .iter()
                .filter(|o| o.order.status != OrderStatus::Cancelled)
                .flat_map(|o| o.items.iter().map(|i| (i.price_at_time, i.quantity))),
        );
        Ok(ReservationDetail {
            reservation: r,
            party_orders,
            bill_total,
        })
    }

    async fn resolve_party(
        &self,
        inputs: &[PartyOrderInput],
    ) -> AppResult<Vec<(String, Vec<PricedLine>)>> {
        let mut party = Vec::with_capacity(inputs.len());
        for input in inputs {
            validate_required_text(&input.person_name, "person_name", MAX_NAME_LEN)?;
            let lines = resolve_lines(&self.menu, &input.items).await?;
            party.push((input.person_name.trim().to_string(), lines));
        }
        Ok(party)
    }
}

/// Party orders are numbered `<reservation number>-<row id>`
fn party_order(r: &Reservation, person: &str, lines: &[PricedLine], now: i64) -> Order {
    let id = snowflake_id();
    Order {
        id,
        order_number: format!("{}-{id}", r.reservation_number),
        order_type: OrderType::Reservation,
        status: OrderStatus::Pending,
        reservation_id: Some(r.id),
        person_name: Some(person.to_string()),
        customer_phone: Some(r.phone_number.clone()),
        customer_address: None,
        target_date: Some(r.date.clone()),
        target_time: Some(r.time.clone()),
        special_instructions: None,
        total_amount: lines_total(lines),
        payment_status: PaymentStatus::Unpaid,
        payment_intent_id: None,
        payment_amount: None,
        payment_date: None,
        confirmation_number: None,
        created_at: now,
        updated_at: now,
    }
}

fn ensure_open(r: &Reservation) -> AppResult<()> {
    if !r.status.accepts_changes() {
        return Err(AppError::new(ErrorCode::ReservationCancelled)
            .with_detail("reservation_number", r.reservation_number.clone()));
    }
    Ok(())
}

fn paid_error(r: &Reservation) -> AppError {
    AppError::with_message(
        ErrorCode::ReservationAlreadyPaid,
        "Reservation is already paid; party orders can no longer change",
    )
    .with_detail("reservation_number", r.reservation_number.clone())
}

fn not_found(key: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ReservationNotFound,
        format!("Reservation {key} not found"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::seed::seed_menu_if_empty;
    use shared::models::OrderItemInput;

    async fn service() -> ReservationService {
        let db = DbService::in_memory().await.unwrap();
        seed_menu_if_empty(&db.pool).await.unwrap();
        let menu = MenuService::new(db.pool.clone());
        let orders = OrderService::new(db.pool.clone(), menu.clone());
        ReservationService::new(db.pool, menu, orders)
    }

    fn line(name: &str, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            menu_item_id: None,
            name: Some(name.into()),
            quantity,
            notes: None,
        }
    }

    fn booking(party_orders: Vec<PartyOrderInput>) -> ReservationCreate {
        ReservationCreate {
            name: "Ann Lee".into(),
            phone_number: "(555) 123-4567".into(),
            party_size: 2,
            date: "2030-06-01".into(),
            time: "19:00".into(),
            special_requests: Some("window seat".into()),
            meta_data: None,
            party_orders,
        }
    }

    #[tokio::test]
    async fn test_create_with_party_orders_bills_from_items() {
        let svc = service().await;
        let detail = svc
            .create(booking(vec![
                PartyOrderInput {
                    person_name: "Ann".into(),
                    items: vec![line("Sous Vide Ribeye", 1), line("Prosecco", 2)],
                },
                PartyOrderInput {
                    person_name: "Ben".into(),
                    items: vec![line("Buffalo Wings", 1)],
                },
            ]))
            .await
            .unwrap();

        assert_eq!(detail.reservation.phone_number, "+15551234567");
        assert_eq!(detail.reservation.reservation_number.len(), 6);
        assert_eq!(detail.party_orders.len(), 2);
        // 34 + 2 × 10 + 12.99
        assert_eq!(detail.bill_total, 66.99);
        assert_eq!(svc.bill_total(detail.reservation.id).await.unwrap(), 66.99);
    }

    #[tokio::test]
    async fn test_lookup_by_number_is_exact() {
        let svc = service().await;
        let a = svc.create(booking(Vec::new())).await.unwrap();
        let b = svc.create(booking(Vec::new())).await.unwrap();

        let found = svc
            .find_by_number(&b.reservation.reservation_number)
            .await
            .unwrap();
        assert_eq!(found.reservation.id, b.reservation.id);
        assert_ne!(found.reservation.id, a.reservation.id);

        let err = svc.find_by_number("000000").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationNotFound);
    }

    #[tokio::test]
    async fn test_cancel_is_irreversible() {
        let svc = service().await;
        let r = svc.create(booking(Vec::new())).await.unwrap();
        let id = r.reservation.id;

        let cancelled = svc.cancel(id).await.unwrap();
        assert_eq!(cancelled.reservation.status, ReservationStatus::Cancelled);

        let err = svc.cancel(id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationAlreadyCancelled);

        let update = ReservationUpdate {
            party_size: Some(4),
            ..Default::default()
        };
        let err = svc.update(id, update).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationCancelled);

        let err = svc
            .add_party_order(
                id,
                PartyOrderInput {
                    person_name: "Ann".into(),
                    items: vec![line("Affogato", 1)],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReservationCancelled);
        assert_eq!(
            svc.get(id).await.unwrap().reservation.status,
            ReservationStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_update_replaces_party_orders() {
        let svc = service().await;
        let r = svc
            .create(booking(vec![PartyOrderInput {
                person_name: "Ann".into(),
                items: vec![line("Affogato", 1)],
            }]))
            .await
            .unwrap();

        let update = ReservationUpdate {
            time: Some("20:15".into()),
            party_orders: Some(vec![PartyOrderInput {
                person_name: "Ben".into(),
                items: vec![line("Lemon Tart", 2)],
            }]),
            ..Default::default()
        };
        let updated = svc.update(r.reservation.id, update).await.unwrap();
        assert_eq!(updated.reservation.time, "20:15");
        assert_eq!(updated.party_orders.len(), 1);
        assert_eq!(updated.party_orders[0].order.person_name.as_deref(), Some("Ben"));
        assert_eq!(updated.bill_total, 18.0);
    }

    #[tokio::test]
    async fn test_validation_rules() {
        let svc = service().await;

        let mut data = booking(Vec::new());
        data.party_size = 21;
        assert_eq!(
            svc.create(data).await.unwrap_err().code,
            ErrorCode::PartySizeInvalid
        );

        let mut data = booking(Vec::new());
        data.date = "2030-02-30".into();
        assert_eq!(svc.create(data).await.unwrap_err().code, ErrorCode::InvalidFormat);

        let mut data = booking(Vec::new());
        data.phone_number = "12".into();
        assert_eq!(
            svc.create(data).await.unwrap_err().code,
            ErrorCode::ValidationFailed
        );

        let data = booking(vec![PartyOrderInput {
            person_name: "Ann".into(),
            items: Vec::new(),
        }]);
        assert_eq!(svc.create(data).await.unwrap_err().code, ErrorCode::OrderEmpty);
    }

    #[tokio::test]
    async fn test_calendar_events_span_two_hours() {
        let svc = service().await;
        svc.create(booking(Vec::new())).await.unwrap();

        let events = svc.calendar(Some("2030-06-01"), Some("2030-06-01")).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, "2030-06-01T19:00:00");
        assert_eq!(events[0].end, "2030-06-01T21:00:00");
        assert_eq!(events[0].title, "Ann Lee (2)");

        assert!(svc.calendar(Some("2030-06-02"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_for_date_skips_cancelled() {
        let svc = service().await;
        let a = svc.create(booking(Vec::new())).await.unwrap();
        svc.create(booking(Vec::new())).await.unwrap();
        svc.cancel(a.reservation.id).await.unwrap();

        assert_eq!(svc.for_date("2030-06-01").await.unwrap().len(), 1);
        assert_eq!(svc.for_phone("+15551234567").await.unwrap().len(), 2);
    }
}
