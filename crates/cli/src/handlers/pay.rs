//! Handlers for the `pay` command group (Stripe)

use super::unlock;
use crate::PayAction;
use anyhow::Result;
use flextk_core::{stripe_settings, PaymentIntent, RefundReason, StripeClient};
use std::collections::BTreeMap;
use std::str::FromStr;

fn print_intent(intent: &PaymentIntent) {
    println!("  Id:        {}", intent.id);
    println!(
        "  Amount:    {} {}",
        intent.amount,
        intent.currency.to_uppercase()
    );
    println!("  Status:    {}", intent.status);
    if let Some(customer) = &intent.customer {
        println!("  Customer:  {}", customer);
    }
    if let Some(secret) = &intent.client_secret {
        println!("  Secret:    {}", secret);
    }
    for (key, value) in &intent.metadata {
        println!("  meta[{}]: {}", key, value);
    }
}

/// Parse repeated `key=value` flags into a metadata map
fn parse_metadata(entries: &[String]) -> Result<BTreeMap<String, String>> {
    let mut metadata = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid metadata entry '{}', expected key=value", entry))?;
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}

pub async fn handle_pay(action: PayAction, password: Option<&str>) -> Result<()> {
    let (config, secrets) = unlock(password)?;
    let settings = stripe_settings(&config, &secrets)?;
    let client = StripeClient::new(&settings);

    match action {
        PayAction::CreateIntent {
            amount,
            currency,
            methods,
            customer,
            metadata,
        } => {
            let metadata = parse_metadata(&metadata)?;
            let intent = client
                .create_payment_intent(amount, &currency, &methods, customer.as_deref(), &metadata)
                .await?;
            println!("  ✅ PaymentIntent created");
            print_intent(&intent);
        }
        PayAction::Confirm {
            intent_id,
            payment_method,
        } => {
            let intent = client
                .confirm_payment_intent(&intent_id, payment_method.as_deref())
                .await?;
            println!("  ✅ PaymentIntent confirmed");
            print_intent(&intent);
        }
        PayAction::Get { intent_id } => {
            let intent = client.get_payment_intent(&intent_id).await?;
            print_intent(&intent);
        }
        PayAction::Refund {
            payment_intent,
            amount,
            reason,
        } => {
            let reason = reason.as_deref().map(RefundReason::from_str).transpose()?;
            let refund = client.create_refund(&payment_intent, amount, reason).await?;
            println!("  ✅ Refund {} ({})", refund.id, refund.status);
            println!(
                "  Amount: {} {}",
                refund.amount,
                refund.currency.to_uppercase()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata() {
        let parsed = parse_metadata(&["order=42".to_string(), "tier=pro".to_string()]).unwrap();
        assert_eq!(parsed.get("order").map(String::as_str), Some("42"));
        assert_eq!(parsed.get("tier").map(String::as_str), Some("pro"));
    }

    #[test]
    fn test_parse_metadata_rejects_missing_equals() {
        assert!(parse_metadata(&["oops".to_string()]).is_err());
    }
}
