//! SWML document served at `GET /receptionist`

use serde_json::{Value, json};

use crate::core::Config;
use crate::voice::signatures;

/// Build the call-flow document: answer, then hand the call to the AI agent
pub fn document(config: &Config) -> Value {
    let web_hook_url = config.receptionist_url();
    let functions: Vec<Value> = signatures::all()
        .iter()
        .map(|f| {
            json!({
                "function": f.function,
                "purpose": f.purpose,
                "argument": f.argument,
            })
        })
        .collect();

    json!({
        "version": "1.0.0",
        "sections": {
            "main": [
                { "answer": {} },
                {
                    "ai": {
                        "params": {
                            "end_of_speech_timeout": 500,
                            "silence_timeout": 500,
                            "max_speech_timeout": 15000,
                        },
                        "languages": [{
                            "name": "English",
                            "code": "en-US",
                            "voice": "rime.spore:mistv2",
                        }],
                        "prompt": { "text": prompt(config) },
                        "SWAIG": {
                            "defaults": { "web_hook_url": web_hook_url },
                            "functions": functions,
                        },
                    }
                }
            ]
        }
    })
}

fn prompt(config: &Config) -> String {
    let name = &config.restaurant_name;
    let open = config.opening_hour;
    let close = config.closing_hour;
    format!(
        "You are the friendly receptionist for {name}. You help callers book, look up, \
change and cancel reservations, browse the menu, place pickup or delivery orders, \
check order status and pay bills by card.

Reservations:
- Every reservation has a 6-digit reservation number. Always read it back when confirming.
- Callers often say numbers as words (\"one one one two two two\"); pass them as heard.
- Bookings are accepted between {open}:00 and {close}:00 and never in the past.
- Guests may pre-order food for each person in the party, or just reserve the table.
- Confirmations, updates and cancellations are texted to the caller.

Orders:
- Orders are for pickup or delivery. Delivery needs an address.
- Confirm the items and quantities before calling create_order.

Payments:
- Use get_card_details first to confirm the amount, then pay_reservation or pay_order.
- While a card is being collected, stay on the payment until it finishes.

Conversation:
- Call each function once per request. Do not repeat a lookup you already have the answer to.
- Call functions without announcing them.
- If the caller asks for a manager, use transfer_to_manager."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_points_at_receptionist() {
        let mut config = Config::default();
        config.public_base_url = "https://bistro.example".into();
        config.restaurant_name = "Chez Test".into();

        let doc = document(&config);
        let ai = &doc["sections"]["main"][1]["ai"];
        assert_eq!(
            ai["SWAIG"]["defaults"]["web_hook_url"],
            "https://bistro.example/receptionist"
        );
        assert!(ai["prompt"]["text"].as_str().unwrap().contains("Chez Test"));
        let functions = ai["SWAIG"]["functions"].as_array().unwrap();
        assert_eq!(functions.len(), signatures::names().len());
    }
}
