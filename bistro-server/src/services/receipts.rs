//! SMS message bodies

use std::fmt::Write;

use chrono_tz::Tz;
use shared::models::{Order, OrderDetail, OrderType, Reservation, ReservationDetail};

use crate::utils::time::{format_12h, format_millis_local, people};

const STOP_FOOTER: &str = "Reply STOP to stop.";

pub fn reservation_confirmed(restaurant: &str, detail: &ReservationDetail) -> String {
    let r = &detail.reservation;
    let mut body = format!("{restaurant} Reservation Confirmed!\n\n");
    reservation_lines(&mut body, r);
    if let Some(req) = r.special_requests.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(body, "Special Requests: {req}");
    }
    if !detail.party_orders.is_empty() {
        let _ = writeln!(body, "Pre-order total: ${:.2}", detail.bill_total);
    }
    let _ = write!(body, "\nWe look forward to serving you!\n{restaurant}\n{STOP_FOOTER}");
    body
}

pub fn reservation_updated(restaurant: &str, r: &Reservation) -> String {
    let mut body = format!("{restaurant} Reservation Updated\n\n");
    reservation_lines(&mut body, r);
    let _ = write!(body, "\nSee you soon!\n{restaurant}\n{STOP_FOOTER}");
    body
}

pub fn reservation_cancelled(restaurant: &str, r: &Reservation) -> String {
    format!(
        "{restaurant} Reservation Cancelled\n\n\
         Reservation Number: {}\n\
         Name: {}\n\
         Date: {} at {}\n\
         Party Size: {}\n\n\
         Your reservation has been cancelled. We hope to serve you again soon!\n\
         {restaurant}\n{STOP_FOOTER}",
        r.reservation_number,
        r.name,
        r.date,
        format_12h(&r.time),
        people(r.party_size),
    )
}

fn reservation_lines(body: &mut String, r: &Reservation) {
    let _ = writeln!(body, "Name: {}", r.name);
    let _ = writeln!(body, "Date: {}", r.date);
    let _ = writeln!(body, "Time: {}", format_12h(&r.time));
    let _ = writeln!(body, "Party Size: {}", people(r.party_size));
    let _ = writeln!(body, "Reservation Number: {}", r.reservation_number);
}

pub fn order_confirmed(restaurant: &str, detail: &OrderDetail) -> String {
    let o = &detail.order;
    let mut body = format!("{restaurant} Order Confirmed!\n\n");
    let _ = writeln!(
        body,
        "Order #{} for {}",
        o.order_number,
        o.person_name.as_deref().unwrap_or("you")
    );
    let _ = writeln!(body, "\nItems Ordered:");
    for item in &detail.items {
        let _ = writeln!(
            body,
            "  - {}x {} (${:.2})",
            item.quantity, item.menu_item_name, item.price_at_time
        );
    }
    let _ = writeln!(body, "\nTotal: ${:.2}", o.total_amount);
    order_timing_lines(&mut body, o);
    if let Some(notes) = o.special_instructions.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(body, "Special instructions: {notes}");
    }
    let _ = write!(
        body,
        "\nCall us anytime to check on your order using order #{}.\n{STOP_FOOTER}",
        o.order_number
    );
    body
}

fn order_timing_lines(body: &mut String, o: &Order) {
    let time = o.target_time.as_deref().map(format_12h).unwrap_or_default();
    match o.order_type {
        OrderType::Pickup => {
            let _ = writeln!(body, "Ready for pickup: {time}");
        }
        OrderType::Delivery => {
            let _ = writeln!(body, "Estimated delivery: {time}");
            if let Some(addr) = &o.customer_address {
                let _ = writeln!(body, "Delivery address: {addr}");
            }
        }
        OrderType::Reservation => {}
    }
}

/// Details of a completed payment
pub struct PaidRecord<'a> {
    pub confirmation_number: &'a str,
    pub amount: f64,
    pub payment_date: i64,
    pub payment_intent_id: &'a str,
}

fn payment_lines(body: &mut String, paid: &PaidRecord<'_>, tz: Tz) {
    let tail_start = paid.payment_intent_id.len().saturating_sub(8);
    let _ = writeln!(body, "Payment Information:");
    let _ = writeln!(body, "  - Amount Paid: ${:.2}", paid.amount);
    let _ = writeln!(
        body,
        "  - Payment Date: {}",
        format_millis_local(paid.payment_date, tz)
    );
    let _ = writeln!(
        body,
        "  - Payment ID: {}",
        paid.payment_intent_id.get(tail_start..).unwrap_or(paid.payment_intent_id)
    );
}

pub fn reservation_payment(
    restaurant: &str,
    r: &Reservation,
    paid: &PaidRecord<'_>,
    tz: Tz,
) -> String {
    let mut body = format!(
        "{restaurant} Payment Receipt\n\nPayment Successful!\n\nCONFIRMATION: {}\n\nReservation Details:\n",
        paid.confirmation_number
    );
    let _ = writeln!(body, "  - Name: {}", r.name);
    let _ = writeln!(body, "  - Date: {}", r.date);
    let _ = writeln!(body, "  - Time: {}", format_12h(&r.time));
    let _ = writeln!(body, "  - Party Size: {}", people(r.party_size));
    let _ = writeln!(body, "  - Reservation #: {}\n", r.reservation_number);
    payment_lines(&mut body, paid, tz);
    let _ = write!(
        body,
        "\nThank you for your payment!\nWe look forward to serving you.\n\n{restaurant}\n{STOP_FOOTER}"
    );
    body
}

pub fn order_payment(restaurant: &str, o: &Order, paid: &PaidRecord<'_>, tz: Tz) -> String {
    let mut body = format!(
        "{restaurant} Payment Receipt\n\nPayment Successful!\n\nCONFIRMATION: {}\n\nOrder Details:\n",
        paid.confirmation_number
    );
    let _ = writeln!(body, "  - Order #: {}", o.order_number);
    let _ = writeln!(body, "  - Type: {}", o.order_type.as_str());
    if let Some(name) = &o.person_name {
        let _ = writeln!(body, "  - Name: {name}");
    }
    order_timing_lines(&mut body, o);
    body.push('\n');
    payment_lines(&mut body, paid, tz);
    let _ = write!(body, "\nThank you for your payment!\n\n{restaurant}\n{STOP_FOOTER}");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderStatus, PaymentStatus, ReservationStatus};

    fn reservation() -> Reservation {
        Reservation {
            id: 1,
            reservation_number: "123456".into(),
            name: "Ann Lee".into(),
            phone_number: "+15551234567".into(),
            party_size: 1,
            date: "2030-01-01".into(),
            time: "19:30".into(),
            status: ReservationStatus::Confirmed,
            payment_status: PaymentStatus::Unpaid,
            special_requests: None,
            meta_data: serde_json::json!({}),
            payment_intent_id: None,
            payment_amount: None,
            payment_date: None,
            confirmation_number: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_reservation_payment_receipt() {
        let paid = PaidRecord {
            confirmation_number: "CONF-0A1B2C3D",
            amount: 45.5,
            payment_date: 1_705_339_800_000,
            payment_intent_id: "pi_abcdefgh12345678",
        };
        let body = reservation_payment(
            "The Bistro",
            &reservation(),
            &paid,
            chrono_tz::America::New_York,
        );
        assert!(body.contains("Payment Successful!"));
        assert!(body.contains("CONFIRMATION: CONF-0A1B2C3D"));
        assert!(body.contains("Amount Paid: $45.50"));
        assert!(body.contains("Payment Date: 01/15/2024 12:30 PM"));
        assert!(body.contains("Payment ID: 12345678"));
        assert!(body.contains("Time: 7:30 PM"));
        assert!(body.contains("Party Size: 1 person"));
        assert!(body.ends_with("Reply STOP to stop."));
    }

    #[test]
    fn test_short_intent_id_is_shown_whole() {
        let paid = PaidRecord {
            confirmation_number: "CONF-1",
            amount: 1.0,
            payment_date: 0,
            payment_intent_id: "pi_1",
        };
        let mut body = String::new();
        payment_lines(&mut body, &paid, chrono_tz::UTC);
        assert!(body.contains("Payment ID: pi_1"));
    }

    #[test]
    fn test_order_confirmation_lists_delivery_address() {
        let order = Order {
            id: 1,
            order_number: "654321".into(),
            order_type: OrderType::Delivery,
            status: OrderStatus::Pending,
            reservation_id: None,
            person_name: Some("Bob".into()),
            customer_phone: Some("+15551234567".into()),
            customer_address: Some("1 Main St".into()),
            target_date: Some("2030-01-01".into()),
            target_time: Some("18:40".into()),
            special_instructions: None,
            total_amount: 16.0,
            payment_status: PaymentStatus::Unpaid,
            payment_intent_id: None,
            payment_amount: None,
            payment_date: None,
            confirmation_number: None,
            created_at: 0,
            updated_at: 0,
        };
        let body = order_confirmed(
            "The Bistro",
            &OrderDetail {
                order,
                items: Vec::new(),
            },
        );
        assert!(body.contains("Order #654321 for Bob"));
        assert!(body.contains("Estimated delivery: 6:40 PM"));
        assert!(body.contains("Delivery address: 1 Main St"));
        assert!(body.contains("Total: $16.00"));
    }

    #[test]
    fn test_cancellation_text() {
        let body = reservation_cancelled("The Bistro", &reservation());
        assert!(body.contains("Reservation Cancelled"));
        assert!(body.contains("Date: 2030-01-01 at 7:30 PM"));
    }
}
