//! Order Service
//!
//! Pickup/delivery orders, kitchen board, and the kitchen status machine.
//! Line pricing helpers are shared with party orders of reservations.

use shared::error::ErrorCode;
use shared::models::{
    KitchenBoard, KitchenQuery, Order, OrderCreate, OrderCreated, OrderDetail, OrderItem,
    OrderItemInput, OrderQuery, OrderStatus, OrderType, PaymentStatus,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::repository::order;
use crate::services::menu_service::MenuService;
use crate::services::money::{sum_lines, validate_quantity};
use crate::services::numbers::next_order_number;
use crate::utils::phone::require_phone;
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, validate_date, validate_optional_text,
    validate_required_text, validate_time,
};
use crate::utils::{AppError, AppResult};

/// A resolved line: menu item id/name plus the price snapshot
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub menu_item_id: i64,
    pub menu_item_name: String,
    pub quantity: i32,
    pub price: f64,
    pub notes: Option<String>,
}

/// Resolve item inputs against the current menu
///
/// Empty input is [`ErrorCode::OrderEmpty`]. Each line needs a menu id or a
/// name, a quantity in `1..=99`, and an available menu item.
pub async fn resolve_lines(menu: &MenuService, items: &[OrderItemInput]) -> AppResult<Vec<PricedLine>> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    let mut lines = Vec::with_capacity(items.len());
    for input in items {
        validate_quantity(input.quantity)?;
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
        let item = match (input.menu_item_id, input.name.as_deref()) {
            (Some(id), _) => menu.orderable_by_id(id).await?,
            (None, Some(name)) if !name.trim().is_empty() => menu.orderable_by_name(name).await?,
            _ => {
                return Err(AppError::with_message(
                    ErrorCode::OrderItemInvalid,
                    "Each item needs a menu_item_id or a name",
                ));
            }
        };
        lines.push(PricedLine {
            menu_item_id: item.id,
            menu_item_name: item.name,
            quantity: input.quantity,
            price: item.price,
            notes: input.notes.clone(),
        });
    }
    Ok(lines)
}

pub fn lines_total(lines: &[PricedLine]) -> f64 {
    sum_lines(lines.iter().map(|l| (l.price, l.quantity)))
}

/// Insert an order row and its lines on one connection (inside a transaction)
pub async fn insert_with_lines(
    conn: &mut SqliteConnection,
    o: &Order,
    lines: &[PricedLine],
) -> AppResult<()> {
    order::insert(&mut *conn, o).await?;
    for line in lines {
        order::insert_item(
            &mut *conn,
            &OrderItem {
                id: snowflake_id(),
                order_id: o.id,
                menu_item_id: line.menu_item_id,
                menu_item_name: line.menu_item_name.clone(),
                quantity: line.quantity,
                price_at_time: line.price,
                notes: line.notes.clone(),
            },
        )
        .await?;
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct OrderService {
    pool: SqlitePool,
    menu: MenuService,
}

impl OrderService {
    pub fn new(pool: SqlitePool, menu: MenuService) -> Self {
        Self { pool, menu }
    }

    /// Create a pickup or delivery order
    pub async fn create(&self, data: OrderCreate) -> AppResult<OrderCreated> {
        if data.order_type == OrderType::Reservation {
            return Err(AppError::validation(
                "Party orders are created through their reservation",
            ));
        }
        let lines = resolve_lines(&self.menu, &data.items).await?;

        let customer_name = data.customer_name.as_deref().unwrap_or_default();
        validate_required_text(customer_name, "customer_name", MAX_NAME_LEN)?;
        let phone = require_phone(
            data.customer_phone.as_deref().unwrap_or_default(),
            "customer_phone",
        )?;
        let target_date = data.target_date.as_deref().unwrap_or_default();
        let target_time = data.target_time.as_deref().unwrap_or_default();
        validate_date(target_date)?;
        validate_time(target_time)?;
        validate_optional_text(&data.special_instructions, "special_instructions", MAX_NOTE_LEN)?;
        if data.order_type == OrderType::Delivery {
            let address = data.customer_address.as_deref().unwrap_or_default();
            validate_required_text(address, "customer_address", MAX_ADDRESS_LEN)?;
        }

        let now = now_millis();
        let o = Order {
            id: snowflake_id(),
            order_number: next_order_number(&self.pool).await?,
            order_type: data.order_type,
            status: OrderStatus::Pending,
            reservation_id: None,
            person_name: Some(customer_name.trim().to_string()),
            customer_phone: Some(phone),
            customer_address: data.customer_address.filter(|a| !a.trim().is_empty()),
            target_date: Some(target_date.to_string()),
            target_time: Some(target_time.to_string()),
            special_instructions: data.special_instructions,
            total_amount: lines_total(&lines),
            payment_status: PaymentStatus::Unpaid,
            payment_intent_id: None,
            payment_amount: None,
            payment_date: None,
            confirmation_number: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await.map_err(db_err)?;
        insert_with_lines(&mut tx, &o, &lines).await?;
        tx.commit().await.map_err(db_err)?;

        tracing::info!(
            order_number = %o.order_number,
            order_type = o.order_type.as_str(),
            total = o.total_amount,
            "Order created"
        );
        let detail = self.get(o.id).await?;
        Ok(OrderCreated {
            estimated_minutes: detail.order.order_type.estimated_minutes(),
            detail,
        })
    }

    pub async fn get(&self, id: i64) -> AppResult<OrderDetail> {
        let o = order::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))?;
        self.with_items(o).await
    }

    /// Exact 6-digit lookup
    pub async fn find_by_number(&self, number: &str) -> AppResult<OrderDetail> {
        let o = order::find_by_number(&self.pool, number.trim())
            .await?
            .ok_or_else(|| not_found(number))?;
        self.with_items(o).await
    }

    /// Most recent standalone order for a phone number
    pub async fn latest_for_phone(&self, phone: &str) -> AppResult<Option<OrderDetail>> {
        match order::find_latest_by_phone(&self.pool, phone).await? {
            Some(o) => Ok(Some(self.with_items(o).await?)),
            None => Ok(None),
        }
    }

    pub async fn list(&self, query: &OrderQuery) -> AppResult<Vec<OrderDetail>> {
        let orders = order::find_all(&self.pool, query).await?;
        self.with_items_all(orders).await
    }

    /// Party orders of one reservation
    pub async fn for_reservation(&self, reservation_id: i64) -> AppResult<Vec<OrderDetail>> {
        let orders = order::find_by_reservation(&self.pool, reservation_id).await?;
        self.with_items_all(orders).await
    }

    /// Active orders of one date grouped by column
    pub async fn kitchen_board(&self, query: &KitchenQuery, today: &str) -> AppResult<KitchenBoard> {
        let date = query.date.clone().unwrap_or_else(|| today.to_string());
        validate_date(&date)?;
        for t in [&query.start_time, &query.end_time].into_iter().flatten() {
            validate_time(t)?;
        }
        let orders = order::find_for_kitchen(
            &self.pool,
            &date,
            query.start_time.as_deref(),
            query.end_time.as_deref(),
        )
        .await?;

        let mut board = KitchenBoard {
            date,
            ..Default::default()
        };
        for detail in self.with_items_all(orders).await? {
            match detail.order.status {
                OrderStatus::Pending => board.pending.push(detail),
                OrderStatus::Preparing => board.preparing.push(detail),
                OrderStatus::Ready => board.ready.push(detail),
                OrderStatus::Completed | OrderStatus::Cancelled => {}
            }
        }
        Ok(board)
    }

    /// Kitchen transition; repeating the current status is a no-op
    pub async fn update_status(&self, id: i64, next: OrderStatus) -> AppResult<OrderDetail> {
        let current = order::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| not_found(&id.to_string()))?;
        if current.status == next {
            return self.with_items(current).await;
        }
        if !current.status.can_transition_to(next) {
            return Err(AppError::with_message(
                ErrorCode::OrderInvalidTransition,
                format!("Cannot change order from {} to {}", current.status, next),
            )
            .with_detail("from", current.status.as_str())
            .with_detail("to", next.as_str()));
        }
        if !order::transition_status(&self.pool, id, current.status, next, now_millis()).await? {
            return Err(AppError::conflict(format!(
                "Order {} was changed concurrently, reload and retry",
                current.order_number
            )));
        }
        tracing::info!(
            order_number = %current.order_number,
            from = current.status.as_str(),
            to = next.as_str(),
            "Order status changed"
        );
        self.get(id).await
    }

    async fn with_items(&self, o: Order) -> AppResult<OrderDetail> {
        let items = order::find_items(&self.pool, o.id).await?;
        Ok(OrderDetail { order: o, items })
    }

    async fn with_items_all(&self, orders: Vec<Order>) -> AppResult<Vec<OrderDetail>> {
        let mut out = Vec::with_capacity(orders.len());
        for o in orders {
            out.push(self.with_items(o).await?);
        }
        Ok(out)
    }
}

fn not_found(key: &str) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {key} not found"))
}

pub(crate) fn db_err(e: sqlx::Error) -> AppError {
    AppError::database(format!("Transaction failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::seed::seed_menu_if_empty;

    async fn service() -> OrderService {
        let db = DbService::in_memory().await.unwrap();
        seed_menu_if_empty(&db.pool).await.unwrap();
        OrderService::new(db.pool.clone(), MenuService::new(db.pool))
    }

    fn item(name: &str, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            menu_item_id: None,
            name: Some(name.into()),
            quantity,
            notes: None,
        }
    }

    fn pickup(items: Vec<OrderItemInput>) -> OrderCreate {
        OrderCreate {
            order_type: OrderType::Pickup,
            customer_name: Some("Ann".into()),
            customer_phone: Some("555-123-4567".into()),
            customer_address: None,
            target_date: Some("2030-01-01".into()),
            target_time: Some("12:30".into()),
            special_instructions: None,
            items,
        }
    }

    #[tokio::test]
    async fn test_zero_items_is_validation_error() {
        let orders = service().await;
        let err = orders.create(pickup(Vec::new())).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderEmpty);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_prices_from_menu() {
        let orders = service().await;
        let created = orders
            .create(pickup(vec![item("Truffle Fries", 2), item("buffalo wings", 1)]))
            .await
            .unwrap();
        assert_eq!(created.estimated_minutes, 25);
        assert_eq!(created.detail.order.total_amount, 28.99);
        assert_eq!(created.detail.items.len(), 2);
        assert_eq!(
            created.detail.order.customer_phone.as_deref(),
            Some("+15551234567")
        );

        let by_number = orders
            .find_by_number(&created.detail.order.order_number)
            .await
            .unwrap();
        assert_eq!(by_number.order.id, created.detail.order.id);
    }

    #[tokio::test]
    async fn test_delivery_requires_address() {
        let orders = service().await;
        let mut data = pickup(vec![item("Affogato", 1)]);
        data.order_type = OrderType::Delivery;
        let err = orders.create(data.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        data.customer_address = Some("1 Main St".into());
        let created = orders.create(data).await.unwrap();
        assert_eq!(created.estimated_minutes, 40);
    }

    #[tokio::test]
    async fn test_status_machine_via_service() {
        let orders = service().await;
        let id = orders
            .create(pickup(vec![item("Affogato", 1)]))
            .await
            .unwrap()
            .detail
            .order
            .id;

        let err = orders.update_status(id, OrderStatus::Completed).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidTransition);

        orders.update_status(id, OrderStatus::Preparing).await.unwrap();
        // repeat is a no-op
        orders.update_status(id, OrderStatus::Preparing).await.unwrap();
        orders.update_status(id, OrderStatus::Ready).await.unwrap();

        let err = orders.update_status(id, OrderStatus::Cancelled).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidTransition);

        let done = orders.update_status(id, OrderStatus::Completed).await.unwrap();
        assert_eq!(done.order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_kitchen_board_groups_active_orders() {
        let orders = service().await;
        let a = orders.create(pickup(vec![item("Affogato", 1)])).await.unwrap();
        let b = orders.create(pickup(vec![item("Lemon Tart", 1)])).await.unwrap();
        orders
            .update_status(b.detail.order.id, OrderStatus::Preparing)
            .await
            .unwrap();

        let query = KitchenQuery {
            date: Some("2030-01-01".into()),
            start_time: Some("12:00".into()),
            end_time: Some("13:00".into()),
        };
        let board = orders.kitchen_board(&query, "2029-12-31").await.unwrap();
        assert_eq!(board.pending.len(), 1);
        assert_eq!(board.pending[0].order.id, a.detail.order.id);
        assert_eq!(board.preparing.len(), 1);

        let late = KitchenQuery {
            start_time: Some("18:00".into()),
            ..query
        };
        let board = orders.kitchen_board(&late, "2029-12-31").await.unwrap();
        assert!(board.pending.is_empty());
    }
}
