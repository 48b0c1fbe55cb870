//! SWAIG function signatures
//!
//! | Group | Functions |
//! |-------|-----------|
//! | clock | get_current_time, get_current_date |
//! | menu | get_menu |
//! | reservation | create / get / update / cancel, get_todays_reservations |
//! | order | create_order, get_order_status, update_order_status |
//! | payment | get_card_details, pay_reservation, pay_order |
//! | front desk | transfer_to_manager, schedule_callback |

use serde::Serialize;
use serde_json::{Value, json};

/// One callable function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub function: &'static str,
    pub purpose: &'static str,
    pub argument: Value,
    /// Allowed while a card is being collected
    #[serde(skip)]
    pub payment_step: bool,
}

impl FunctionSpec {
    fn new(function: &'static str, purpose: &'static str, argument: Value) -> Self {
        Self {
            function,
            purpose,
            argument,
            payment_step: false,
        }
    }

    fn payment(mut self) -> Self {
        self.payment_step = true;
        self
    }

    /// Signature entry with the webhook URL filled in
    pub fn to_signature(&self, web_hook_url: &str) -> Value {
        json!({
            "function": self.function,
            "purpose": self.purpose,
            "argument": self.argument,
            "web_hook_url": web_hook_url,
        })
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn items_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Menu item name as spoken"},
                "menu_item_id": {"type": "integer"},
                "quantity": {"type": "integer", "default": 1},
                "notes": {"type": "string"}
            }
        }
    })
}

/// Every function the receptionist exposes, in prompt order
pub fn all() -> Vec<FunctionSpec> {
    let lookup = json!({
        "reservation_number": {"type": "string", "description": "6-digit reservation number, digits or spoken words"},
        "reservation_id": {"type": "integer"},
        "phone_number": {"type": "string"}
    });

    vec![
        FunctionSpec::new(
            "get_current_time",
            "Current time at the restaurant",
            object(json!({}), &[]),
        ),
        FunctionSpec::new(
            "get_current_date",
            "Today's date at the restaurant",
            object(json!({}), &[]),
        ),
        FunctionSpec::new(
            "get_menu",
            "Read the menu, optionally one category",
            object(
                json!({
                    "category": {"type": "string", "description": "Starter, Main, Dessert, Cocktail, Wine or Non-Alcoholic"},
                    "format": {"type": "string", "enum": ["text", "json"]}
                }),
                &[],
            ),
        ),
        FunctionSpec::new(
            "create_reservation",
            "Book a table, optionally with pre-orders for each guest",
            object(
                json!({
                    "name": {"type": "string"},
                    "party_size": {"type": "integer"},
                    "date": {"type": "string", "description": "YYYY-MM-DD or spoken date"},
                    "time": {"type": "string", "description": "HH:MM (24h) or spoken time"},
                    "phone_number": {"type": "string", "description": "Defaults to the caller id"},
                    "special_requests": {"type": "string"},
                    "party_orders": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "person_name": {"type": "string"},
                                "items": items_schema()
                            }
                        }
                    },
                    "pre_order": items_schema()
                }),
                &["name", "party_size", "date", "time"],
            ),
        ),
        FunctionSpec::new(
            "get_reservation",
            "Look up reservations by number, name, date or phone",
            object(
                json!({
                    "reservation_number": {"type": "string"},
                    "reservation_id": {"type": "integer"},
                    "name": {"type": "string"},
                    "date": {"type": "string"},
                    "phone_number": {"type": "string"},
                    "format": {"type": "string", "enum": ["text", "json"]}
                }),
                &[],
            ),
        ),
        FunctionSpec::new(
            "update_reservation",
            "Change an existing reservation",
            object(
                {
                    let mut props = lookup.clone();
                    if let Some(map) = props.as_object_mut() {
                        map.insert("name".into(), json!({"type": "string"}));
                        map.insert("party_size".into(), json!({"type": "integer"}));
                        map.insert("date".into(), json!({"type": "string"}));
                        map.insert("time".into(), json!({"type": "string"}));
                        map.insert("special_requests".into(), json!({"type": "string"}));
                    }
                    props
                },
                &[],
            ),
        ),
        FunctionSpec::new(
            "cancel_reservation",
            "Cancel a reservation",
            object(lookup.clone(), &[]),
        ),
        FunctionSpec::new(
            "get_todays_reservations",
            "Summary of today's bookings",
            object(json!({}), &[]),
        ),
        FunctionSpec::new(
            "create_order",
            "Place a pickup or delivery order",
            object(
                json!({
                    "items": items_schema(),
                    "order_type": {"type": "string", "enum": ["pickup", "delivery"]},
                    "customer_name": {"type": "string"},
                    "customer_phone": {"type": "string", "description": "Defaults to the caller id"},
                    "customer_address": {"type": "string", "description": "Required for delivery"},
                    "special_instructions": {"type": "string"},
                    "payment_preference": {"type": "string", "enum": ["now", "pickup"]}
                }),
                &["items"],
            ),
        ),
        FunctionSpec::new(
            "get_order_status",
            "Status of an order by number or the caller's latest order",
            object(
                json!({
                    "order_number": {"type": "string"},
                    "customer_phone": {"type": "string"}
                }),
                &[],
            ),
        ),
        FunctionSpec::new(
            "update_order_status",
            "Move an order through the kitchen (staff only)",
            object(
                json!({
                    "order_number": {"type": "string"},
                    "status": {"type": "string", "enum": ["preparing", "ready", "completed", "cancelled"]}
                }),
                &["order_number", "status"],
            ),
        ),
        FunctionSpec::new(
            "get_card_details",
            "Look up the amount due before taking a card payment",
            object(
                json!({
                    "reservation_number": {"type": "string"},
                    "order_number": {"type": "string"}
                }),
                &[],
            ),
        )
        .payment(),
        FunctionSpec::new(
            "pay_reservation",
            "Collect card payment for a reservation bill",
            object(
                json!({
                    "reservation_number": {"type": "string"},
                    "phone_number": {"type": "string"}
                }),
                &[],
            ),
        )
        .payment(),
        FunctionSpec::new(
            "pay_order",
            "Collect card payment for an order",
            object(
                json!({
                    "order_number": {"type": "string"},
                    "phone_number": {"type": "string"}
                }),
                &[],
            ),
        )
        .payment(),
        FunctionSpec::new(
            "transfer_to_manager",
            "Transfer the caller to a manager",
            object(json!({"reason": {"type": "string"}}), &[]),
        ),
        FunctionSpec::new(
            "schedule_callback",
            "Record a request for the restaurant to call back",
            object(
                json!({
                    "phone_number": {"type": "string"},
                    "preferred_time": {"type": "string"},
                    "reason": {"type": "string"}
                }),
                &[],
            ),
        ),
    ]
}

pub fn find(name: &str) -> Option<FunctionSpec> {
    all().into_iter().find(|f| f.function == name)
}

pub fn names() -> Vec<&'static str> {
    all().iter().map(|f| f.function).collect()
}
