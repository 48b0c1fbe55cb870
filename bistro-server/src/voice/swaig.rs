//! SWAIG wire types
//!
//! The agent platform posts loosely shaped JSON: arguments arrive as
//! `{"parsed": [{...}]}`, `{"raw": "<json>"}` or a plain object, and numbers
//! are often strings. [`Args`] smooths that over for the skills.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::utils::phone::words_to_digits;

/// POST /receptionist body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwaigRequest {
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub argument: Value,
    #[serde(default)]
    pub action: Option<String>,
    /// Signature request: names whose schemas are wanted
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub ai_session_id: Option<String>,
    #[serde(default)]
    pub caller_id_num: Option<String>,
    #[serde(default)]
    pub caller_id_number: Option<String>,
    #[serde(default)]
    pub global_data: Value,
    #[serde(default)]
    pub call_log: Value,
}

impl SwaigRequest {
    pub fn is_signature_request(&self) -> bool {
        self.action.as_deref() == Some("get_signature")
    }

    /// Function arguments, whatever envelope they came in
    pub fn args(&self) -> Args {
        Args(extract_arguments(&self.argument))
    }

    /// Caller id from the request or its global data
    pub fn caller_phone(&self) -> Option<String> {
        let from_global = |key: &str| {
            self.global_data
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        self.caller_id_num
            .clone()
            .or_else(|| self.caller_id_number.clone())
            .or_else(|| from_global("caller_id_number"))
            .or_else(|| from_global("caller_id_num"))
            .filter(|s| !s.trim().is_empty())
    }

    pub fn call_id(&self) -> &str {
        self.call_id.as_deref().unwrap_or("unknown")
    }

    pub fn session_id(&self) -> &str {
        self.ai_session_id
            .as_deref()
            .or(self.call_id.as_deref())
            .unwrap_or("unknown")
    }
}

fn extract_arguments(argument: &Value) -> Map<String, Value> {
    match argument {
        Value::Object(obj) => {
            if let Some(parsed) = obj.get("parsed") {
                return match parsed {
                    Value::Array(list) => list
                        .first()
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                    Value::Object(map) => map.clone(),
                    _ => Map::new(),
                };
            }
            if let Some(raw) = obj.get("raw").and_then(Value::as_str) {
                return match serde_json::from_str::<Value>(raw) {
                    Ok(Value::Object(map)) => map,
                    _ => {
                        tracing::warn!(raw, "Unparseable raw SWAIG argument");
                        Map::new()
                    }
                };
            }
            obj.clone()
        }
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// Loosely typed argument map
#[derive(Debug, Clone, Default)]
pub struct Args(pub Map<String, Value>);

impl Args {
    /// Non-empty trimmed string (numbers are stringified)
    pub fn str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First present key
    pub fn str_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.str(k))
    }

    /// Integer given as number, numeric string or spoken words ("four")
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse().ok().or_else(|| {
                    let digits: String = words_to_digits(s)
                        .chars()
                        .filter(char::is_ascii_digit)
                        .collect();
                    digits.parse().ok()
                })
            }
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn array(&self, key: &str) -> Vec<Value> {
        match self.0.get(key) {
            Some(Value::Array(list)) => list.clone(),
            _ => Vec::new(),
        }
    }

    /// `format: json` asks for data instead of speech
    pub fn wants_json(&self) -> bool {
        self.str("format")
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Card collection settings for the `pay` action
#[derive(Debug, Clone, Serialize)]
pub struct PayRequest {
    pub payment_connector_url: String,
    pub charge_amount: String,
    pub currency: String,
    pub description: String,
    /// Handed back to the payment callback
    pub parameters: Vec<(String, String)>,
}

/// SWAIG function response: speech text plus actions
#[derive(Debug, Clone, Default)]
pub struct FunctionResult {
    pub response: String,
    pub actions: Vec<Value>,
}

impl FunctionResult {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            actions: Vec::new(),
        }
    }

    /// Structured data for the agent, e.g. `("reservation_data", {...})`
    pub fn add_action(mut self, name: &str, data: impl Serialize) -> Self {
        let value = serde_json::to_value(data).unwrap_or(Value::Null);
        self.actions.push(json!({ name: value }));
        self
    }

    /// Ask the platform to send a text message
    pub fn send_sms(self, to: &str, from: &str, body: &str) -> Self {
        self.swml_action(json!({
            "send_sms": {
                "to_number": to,
                "from_number": from,
                "body": body,
            }
        }))
    }

    /// Start DTMF card collection; the result is posted to the connector URL
    pub fn pay(self, pay: &PayRequest) -> Self {
        let parameters: Vec<Value> = pay
            .parameters
            .iter()
            .map(|(name, value)| json!({"name": name, "value": value}))
            .collect();
        self.swml_action(json!({
            "pay": {
                "payment_connector_url": pay.payment_connector_url,
                "input": "dtmf",
                "payment_method": "credit-card",
                "timeout": 10,
                "max_attempts": 3,
                "security_code": true,
                "postal_code": true,
                "min_postal_code_length": 5,
                "token_type": "one-time",
                "charge_amount": pay.charge_amount,
                "currency": pay.currency,
                "language": "en-US",
                "voice": "woman",
                "description": pay.description,
                "valid_card_types": "visa mastercard amex discover",
                "parameters": parameters,
            }
        }))
    }

    /// Transfer the call
    pub fn connect(self, to: &str) -> Self {
        self.swml_action(json!({ "connect": { "to": to } }))
    }

    fn swml_action(mut self, verb: Value) -> Self {
        self.actions.push(json!({
            "SWML": {
                "version": "1.0.0",
                "sections": { "main": [verb] },
            }
        }));
        self
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("response".into(), Value::String(self.response.clone()));
        if !self.actions.is_empty() {
            body.insert("action".into(), Value::Array(self.actions.clone()));
        }
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(argument: Value) -> SwaigRequest {
        SwaigRequest {
            argument,
            ..Default::default()
        }
    }

    #[test]
    fn test_argument_envelopes() {
        let parsed = request(json!({"parsed": [{"name": "Ann"}]}));
        assert_eq!(parsed.args().str("name").as_deref(), Some("Ann"));

        let raw = request(json!({"raw": "{\"party_size\": 4}"}));
        assert_eq!(raw.args().int("party_size"), Some(4));

        let plain = request(json!({"date": "2030-01-01"}));
        assert_eq!(plain.args().str("date").as_deref(), Some("2030-01-01"));

        let broken = request(json!({"raw": "{not json"}));
        assert!(broken.args().is_empty());
    }

    #[test]
    fn test_loose_values() {
        let args = Args(
            json!({
                "a": "4",
                "b": "four",
                "c": 2.0,
                "flag": "yes",
                "blank": "  ",
                "format": "JSON"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        assert_eq!(args.int("a"), Some(4));
        assert_eq!(args.int("b"), Some(4));
        assert_eq!(args.int("c"), Some(2));
        assert_eq!(args.bool("flag"), Some(true));
        assert_eq!(args.str("blank"), None);
        assert!(args.wants_json());
    }

    #[test]
    fn test_caller_phone_fallbacks() {
        let mut req = request(Value::Null);
        req.global_data = json!({"caller_id_number": "+15551234567"});
        assert_eq!(req.caller_phone().as_deref(), Some("+15551234567"));
        req.caller_id_num = Some("+15550000000".into());
        assert_eq!(req.caller_phone().as_deref(), Some("+15550000000"));
    }

    #[test]
    fn test_result_shape() {
        let plain = FunctionResult::new("hello").to_json();
        assert_eq!(plain, json!({"response": "hello"}));

        let with_actions = FunctionResult::new("bye")
            .add_action("order_data", json!({"id": 1}))
            .connect("+15550001111")
            .to_json();
        let actions = with_actions["action"].as_array().unwrap();
        assert_eq!(actions[0]["order_data"]["id"], 1);
        assert_eq!(
            actions[1]["SWML"]["sections"]["main"][0]["connect"]["to"],
            "+15550001111"
        );
    }

    #[test]
    fn test_pay_action_parameters() {
        let result = FunctionResult::new("card please").pay(&PayRequest {
            payment_connector_url: "https://x/api/signalwire/payment-callback".into(),
            charge_amount: "42.50".into(),
            currency: "usd".into(),
            description: "The Bistro Order #123456".into(),
            parameters: vec![("order_number".into(), "123456".into())],
        });
        let pay = &result.actions[0]["SWML"]["sections"]["main"][0]["pay"];
        assert_eq!(pay["charge_amount"], "42.50");
        assert_eq!(pay["parameters"][0]["name"], "order_number");
        assert_eq!(pay["parameters"][0]["value"], "123456");
    }
}
