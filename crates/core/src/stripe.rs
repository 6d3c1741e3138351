//! Stripe payment gateway client (PaymentIntents and refunds)
//!
//! Stripe's API is form-encoded; nested fields use bracket syntax, e.g.
//! `payment_method_types[0]` and `metadata[key]`.

use crate::error::{Error, Result};
use crate::settings::StripeSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Accepted reasons for a refund
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundReason {
    Duplicate,
    Fraudulent,
    RequestedByCustomer,
}

impl fmt::Display for RefundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefundReason::Duplicate => "duplicate",
            RefundReason::Fraudulent => "fraudulent",
            RefundReason::RequestedByCustomer => "requested_by_customer",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for RefundReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "duplicate" => Ok(RefundReason::Duplicate),
            "fraudulent" => Ok(RefundReason::Fraudulent),
            "requested_by_customer" => Ok(RefundReason::RequestedByCustomer),
            other => Err(Error::InvalidInput(format!(
                "Unknown refund reason '{}' (expected duplicate, fraudulent or requested_by_customer)",
                other
            ))),
        }
    }
}

/// A Stripe PaymentIntent
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// A Stripe refund
#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: String,
}

/// Stripe REST client
pub struct StripeClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl StripeClient {
    pub fn new(settings: &StripeSettings) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
        }
    }

    /// Create a PaymentIntent. Amount is in the currency's smallest unit.
    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        payment_method_types: &[String],
        customer: Option<&str>,
        metadata: &BTreeMap<String, String>,
    ) -> Result<PaymentIntent> {
        if amount_cents <= 0 {
            return Err(Error::InvalidInput(
                "Amount must be a positive number of cents".to_string(),
            ));
        }

        let form = intent_form(
            amount_cents,
            currency,
            payment_method_types,
            customer,
            metadata,
        );

        let response = self
            .http_client
            .post(format!("{}/payment_intents", API_BASE))
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Confirm a PaymentIntent, optionally with an explicit payment method
    pub async fn confirm_payment_intent(
        &self,
        intent_id: &str,
        payment_method: Option<&str>,
    ) -> Result<PaymentIntent> {
        let mut form: Vec<(String, String)> = Vec::new();
        if let Some(method) = payment_method {
            form.push(("payment_method".to_string(), method.to_string()));
        }

        let response = self
            .http_client
            .post(format!("{}/payment_intents/{}/confirm", API_BASE, intent_id))
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Retrieve a PaymentIntent by id
    pub async fn get_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent> {
        let response = self
            .http_client
            .get(format!("{}/payment_intents/{}", API_BASE, intent_id))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Refund (part of) a PaymentIntent
    pub async fn create_refund(
        &self,
        payment_intent: &str,
        amount_cents: Option<i64>,
        reason: Option<RefundReason>,
    ) -> Result<Refund> {
        let mut form: Vec<(String, String)> = vec![(
            "payment_intent".to_string(),
            payment_intent.to_string(),
        )];
        if let Some(amount) = amount_cents {
            if amount <= 0 {
                return Err(Error::InvalidInput(
                    "Refund amount must be a positive number of cents".to_string(),
                ));
            }
            form.push(("amount".to_string(), amount.to_string()));
        }
        if let Some(reason) = reason {
            form.push(("reason".to_string(), reason.to_string()));
        }

        let response = self
            .http_client
            .post(format!("{}/refunds", API_BASE))
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }
}

/// Build the form body of a PaymentIntent creation
fn intent_form(
    amount_cents: i64,
    currency: &str,
    payment_method_types: &[String],
    customer: Option<&str>,
    metadata: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), amount_cents.to_string()),
        ("currency".to_string(), currency.to_lowercase()),
    ];

    for (i, method) in payment_method_types.iter().enumerate() {
        form.push((format!("payment_method_types[{}]", i), method.clone()));
    }
    if let Some(customer) = customer {
        form.push(("customer".to_string(), customer.to_string()));
    }
    for (key, value) in metadata {
        form.push((format!("metadata[{}]", key), value.clone()));
    }

    form
}

async fn handle_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => format!("{}: {}", envelope.error.error_type, envelope.error.message),
        Err(_) => body,
    };

    match status {
        reqwest::StatusCode::UNAUTHORIZED => Err(Error::Authentication(format!(
            "Stripe rejected the API key: {}",
            message
        ))),
        reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound(message)),
        _ => Err(Error::StripeApi(format!(
            "HTTP {}: {}",
            status.as_u16(),
            message
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_refund_reason_round_trip() {
        for (s, r) in [
            ("duplicate", RefundReason::Duplicate),
            ("fraudulent", RefundReason::Fraudulent),
            ("requested_by_customer", RefundReason::RequestedByCustomer),
        ] {
            assert_eq!(RefundReason::from_str(s).unwrap(), r);
            assert_eq!(r.to_string(), s);
        }
        assert!(RefundReason::from_str("because").is_err());
    }

    #[test]
    fn test_intent_form_encoding() {
        let mut metadata = BTreeMap::new();
        metadata.insert("order_id".to_string(), "42".to_string());

        let form = intent_form(
            1999,
            "EUR",
            &["card".to_string(), "sepa_debit".to_string()],
            Some("cus_123"),
            &metadata,
        );

        assert!(form.contains(&("amount".to_string(), "1999".to_string())));
        assert!(form.contains(&("currency".to_string(), "eur".to_string())));
        assert!(form.contains(&("payment_method_types[0]".to_string(), "card".to_string())));
        assert!(form.contains(&(
            "payment_method_types[1]".to_string(),
            "sepa_debit".to_string()
        )));
        assert!(form.contains(&("customer".to_string(), "cus_123".to_string())));
        assert!(form.contains(&("metadata[order_id]".to_string(), "42".to_string())));
    }

    #[test]
    fn test_payment_intent_parsing() {
        let json = r#"{
            "id": "pi_123",
            "amount": 1999,
            "currency": "eur",
            "status": "requires_confirmation",
            "client_secret": "pi_123_secret_abc",
            "metadata": {"order_id": "42"}
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.metadata.get("order_id").map(String::as_str), Some("42"));
        assert!(intent.customer.is_none());
    }

    #[test]
    fn test_error_envelope_parsing() {
        let json = r#"{"error": {"type": "invalid_request_error", "message": "No such payment_intent"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.error.error_type, "invalid_request_error");
    }
}
