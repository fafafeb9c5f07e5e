//! Mock backend for testing
//!
//! Returns scripted responses without a running model server. When no
//! script is configured, the prompt is sniffed for the schema being
//! requested and a plausible response is fabricated.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::{MediaPayload, ModelBackend};

/// Mock model backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Scripted response returned by every `generate` call
    scripted: Option<String>,
    /// When set, `generate` fails instead of responding
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            scripted: None,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that always returns the given raw response
    pub fn with_response(response: &str) -> Self {
        Self {
            healthy: true,
            scripted: Some(response.to_string()),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock whose `generate` always fails as unavailable
    pub fn failing() -> Self {
        Self {
            healthy: false,
            scripted: None,
            fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `generate` calls made against this mock
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn default_response(prompt: &str) -> String {
        if prompt.contains("net_pay") {
            r#"{"net_pay": 2450.50, "gross_pay": 3100.00, "employer": "Acme GmbH", "pay_date": "2026-07-31"}"#
                .to_string()
        } else if prompt.contains("budget") {
            r#"[
                {"category": "Dining", "monthly_limit": 180.0, "justification": "Averaging well above comparable households"},
                {"category": "Shopping", "monthly_limit": 120.0, "justification": "Several impulse purchases last month"}
            ]"#
            .to_string()
        } else {
            r#"[
                {"amount": -42.10, "date": "2026-07-02", "description": "SUPERMARKET", "category": "Groceries"},
                {"amount": 1500.00, "date": "2026-07-01", "description": "SALARY", "category": "Income"}
            ]"#
            .to_string()
        }
    }
}

#[async_trait::async_trait]
impl ModelBackend for MockBackend {
    async fn generate(&self, prompt: &str, _media: Option<&MediaPayload>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::ModelUnavailable("mock backend configured to fail".into()));
        }
        Ok(self
            .scripted
            .clone()
            .unwrap_or_else(|| Self::default_response(prompt)))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
