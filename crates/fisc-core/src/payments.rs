//! Payment gateway client
//!
//! Creates checkout preferences against the external payment gateway.
//! A missing access token is an operator problem (`Configuration`), a
//! gateway outage is transient; neither may crash a request handler.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AppUser, Plan};

/// Environment variable holding the gateway access token
pub const PAYMENT_TOKEN_ENV: &str = "FISC_PAYMENT_ACCESS_TOKEN";

/// Environment variable overriding the gateway base URL
pub const PAYMENT_BASE_ENV: &str = "FISC_PAYMENT_API_BASE";

const DEFAULT_API_BASE: &str = "https://api.mercadopago.com";

/// A created checkout preference: the id assigned by the gateway and
/// the URL the user is redirected to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPreference {
    pub id: String,
    pub init_point: String,
}

#[derive(Debug, Serialize)]
struct PreferenceRequest {
    items: Vec<PreferenceItem>,
    payer: PreferencePayer,
    external_reference: String,
}

#[derive(Debug, Serialize)]
struct PreferenceItem {
    title: String,
    description: String,
    quantity: u32,
    currency_id: String,
    unit_price: f64,
}

#[derive(Debug, Serialize)]
struct PreferencePayer {
    email: String,
}

/// Checkout-preference client
#[derive(Clone)]
pub struct CheckoutClient {
    http_client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl CheckoutClient {
    pub fn new(base_url: &str, access_token: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Create from environment variables. Always returns a client;
    /// whether a token is configured is only checked at call time so
    /// the error surfaces where an operator will see it.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(PAYMENT_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let access_token = std::env::var(PAYMENT_TOKEN_ENV).ok();
        Self::new(&base_url, access_token)
    }

    /// Create a checkout preference for a plan purchase, returning the
    /// redirect URL for the user.
    pub async fn create_preference(
        &self,
        plan: &Plan,
        principal: &AppUser,
    ) -> Result<CheckoutPreference> {
        let token = self.access_token.as_deref().ok_or_else(|| {
            Error::Configuration(format!(
                "Payment access token not configured (set {})",
                PAYMENT_TOKEN_ENV
            ))
        })?;

        let plan_id = plan
            .id
            .ok_or_else(|| Error::InvalidInput("plan has no id".into()))?;

        let request = PreferenceRequest {
            items: vec![PreferenceItem {
                title: plan.name.clone(),
                description: plan.description.clone(),
                quantity: 1,
                currency_id: plan.currency.clone(),
                unit_price: plan.price,
            }],
            payer: PreferencePayer {
                email: principal.email.clone(),
            },
            external_reference: format!("plan:{}:user:{}", plan_id, principal.id),
        };

        let response = self
            .http_client
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ModelUnavailable(format!(
                "Payment gateway error {}",
                response.status()
            )));
        }

        let preference: CheckoutPreference = response.json().await?;
        debug!(preference_id = %preference.id, user = %principal.email, "Checkout preference created");
        Ok(preference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserStatus};
    use chrono::Utc;

    fn plan() -> Plan {
        Plan {
            id: Some(1),
            name: "Premium".to_string(),
            price: 9.99,
            currency: "USD".to_string(),
            description: "Premium features".to_string(),
        }
    }

    fn principal() -> AppUser {
        AppUser {
            id: 7,
            email: "ana@example.com".to_string(),
            display_name: "Ana".to_string(),
            role: Role::User,
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_configuration_error() {
        let client = CheckoutClient::new("http://localhost:9", None);
        let err = client.create_preference(&plan(), &principal()).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_transient_error() {
        // Port 9 (discard) is not listening; the call must fail
        // without panicking and be classified as transient.
        let client = CheckoutClient::new("http://127.0.0.1:9", Some("token".to_string()));
        let err = client.create_preference(&plan(), &principal()).await.unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_plan_without_id_rejected() {
        let client = CheckoutClient::new("http://localhost:9", Some("token".to_string()));
        let mut p = plan();
        p.id = None;
        let err = client.create_preference(&p, &principal()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
