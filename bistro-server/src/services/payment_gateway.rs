//! Payment gateway client
//!
//! Only intent creation is called from here; confirmations arrive through
//! the webhook and callback routes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::config::StripeConfig;
use crate::utils::{AppError, AppResult, ErrorCode};

/// Intent creation parameters
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub description: String,
    /// Sent as `metadata[key]=value`
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> AppResult<CreatedIntent>;

    /// Key handed to the browser SDK
    fn publishable_key(&self) -> Option<String>;

    fn name(&self) -> &'static str;
}

/// Stripe `POST /v1/payment_intents`
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    publishable_key: Option<String>,
}

impl StripeGateway {
    pub fn from_config(config: &StripeConfig) -> Option<Self> {
        Some(Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone()?,
            publishable_key: config.publishable_key.clone(),
        })
    }
}

/// Form body for the intents endpoint
fn intent_form(request: &IntentRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), request.amount_cents.to_string()),
        ("currency".to_string(), request.currency.to_lowercase()),
        ("description".to_string(), request.description.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    form.extend(
        request
            .metadata
            .iter()
            .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
    );
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(&self, request: &IntentRequest) -> AppResult<CreatedIntent> {
        let resp = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.api_key)
            .form(&intent_form(request))
            .send()
            .await
            .map_err(|e| {
                AppError::with_message(
                    ErrorCode::NetworkError,
                    format!("Payment gateway unreachable: {e}"),
                )
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::gateway(format!(
                "Payment intent rejected: {status} - {text}"
            )));
        }

        let intent: CreatedIntent = resp
            .json()
            .await
            .map_err(|e| AppError::gateway(format!("Invalid gateway response: {e}")))?;
        tracing::info!(target: "payment", intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    fn publishable_key(&self) -> Option<String> {
        self.publishable_key.clone()
    }

    fn name(&self) -> &'static str {
        "stripe"
    }
}

/// Local intents for development and tests (`pi_local_…`)
#[derive(Debug, Default)]
pub struct OfflineGateway;

#[async_trait]
impl PaymentGateway for OfflineGateway {
    async fn create_intent(&self, request: &IntentRequest) -> AppResult<CreatedIntent> {
        let id = format!("pi_local_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(
            target: "payment",
            intent_id = %id,
            amount_cents = request.amount_cents,
            "Offline payment intent created"
        );
        Ok(CreatedIntent {
            client_secret: Some(format!("{id}_secret_local")),
            id,
        })
    }

    fn publishable_key(&self) -> Option<String> {
        None
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

pub fn gateway_from_config(config: &StripeConfig) -> Arc<dyn PaymentGateway> {
    match StripeGateway::from_config(config) {
        Some(gateway) => Arc::new(gateway),
        None => {
            tracing::warn!("STRIPE_API_KEY not set, using offline payment intents");
            Arc::new(OfflineGateway)
        }
    }
}
