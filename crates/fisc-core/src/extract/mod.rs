//! Structured extraction pipeline
//!
//! Wraps a generative-model call in schema validation: a document goes
//! in, and only data that conforms to the declared output schema comes
//! out. Single-object extraction fails closed when the schema's anchor
//! field is missing; batch extraction validates each element
//! independently and silently drops the invalid ones.
//!
//! Every call is stateless and one-shot: no retry loop, no streaming,
//! no partial-result resumption. Callers wanting bounded latency wrap
//! the call in their own timeout.

pub mod schema;

use serde_json::{Map, Value};
use tracing::warn;

use crate::ai::{parsing, AIClient, MediaPayload, ModelBackend};
use crate::error::{Error, Result};
use crate::models::{PayslipData, StatementTransaction};
use crate::prompts;

use schema::{payslip_schema, transaction_schema, RecordSchema};

/// The extraction pipeline around one model client
#[derive(Clone)]
pub struct Extractor {
    client: AIClient,
}

impl Extractor {
    pub fn new(client: AIClient) -> Self {
        Self { client }
    }

    /// The model client this pipeline sends prompts to
    pub fn client(&self) -> &AIClient {
        &self.client
    }

    /// Extract a single structured record from a document.
    ///
    /// Fails with `InvalidInput` for an empty payload, with
    /// `ModelOutputInvalid` when the anchor field is missing or
    /// mistyped, and with `ModelUnavailable` when the backend call
    /// errors. There is never a partial result.
    pub async fn extract(
        &self,
        document: &MediaPayload,
        schema: &RecordSchema,
    ) -> Result<Map<String, Value>> {
        if document.is_empty() {
            return Err(Error::InvalidInput("document payload is empty".into()));
        }

        let prompt = prompts::document_extraction_prompt(schema);
        let response = self.client.generate(&prompt, Some(document)).await?;

        let candidate = parsing::extract_json_object(&response)?;
        schema.validate_record(&candidate)
    }

    /// Extract an ordered sequence of records from a document.
    ///
    /// Each element is validated independently; elements that fail
    /// validation are dropped with a warning rather than failing the
    /// whole batch.
    pub async fn extract_batch(
        &self,
        document: &MediaPayload,
        item_schema: &RecordSchema,
    ) -> Result<Vec<Map<String, Value>>> {
        if document.is_empty() {
            return Err(Error::InvalidInput("document payload is empty".into()));
        }

        let prompt = prompts::statement_extraction_prompt(item_schema);
        let response = self.client.generate(&prompt, Some(document)).await?;

        let candidates = parsing::extract_json_array(&response)?;
        let total = candidates.len();

        let validated: Vec<Map<String, Value>> = candidates
            .iter()
            .filter_map(|candidate| match item_schema.validate_record(candidate) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(schema = %item_schema.name, error = %e, "Dropping invalid batch element");
                    None
                }
            })
            .collect();

        if validated.len() < total {
            warn!(
                schema = %item_schema.name,
                kept = validated.len(),
                dropped = total - validated.len(),
                "Batch extraction dropped invalid elements"
            );
        }

        Ok(validated)
    }

    /// Extract payslip data from a PDF. Anchor: `net_pay`.
    pub async fn extract_payslip(&self, pdf: &[u8]) -> Result<PayslipData> {
        let document = MediaPayload::pdf(pdf.to_vec());
        let record = self.extract(&document, &payslip_schema()).await?;
        let data = serde_json::from_value(Value::Object(record))?;
        Ok(data)
    }

    /// Extract the transactions of a bank statement PDF. Anchor per
    /// transaction: `amount`.
    pub async fn extract_statement(&self, pdf: &[u8]) -> Result<Vec<StatementTransaction>> {
        let document = MediaPayload::pdf(pdf.to_vec());
        let records = self.extract_batch(&document, &transaction_schema()).await?;

        let transactions = records
            .into_iter()
            .filter_map(|record| serde_json::from_value(Value::Object(record)).ok())
            .collect();
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn extractor_with(response: &str) -> Extractor {
        Extractor::new(AIClient::Mock(MockBackend::with_response(response)))
    }

    #[tokio::test]
    async fn test_empty_document_is_invalid_input() {
        let extractor = Extractor::new(AIClient::mock());
        let empty = MediaPayload::pdf(vec![]);
        let err = extractor.extract(&empty, &payslip_schema()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = extractor
            .extract_batch(&empty, &transaction_schema())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_payslip_extraction_happy_path() {
        let extractor = Extractor::new(AIClient::mock());
        let data = extractor.extract_payslip(b"%PDF-1.4 payslip").await.unwrap();
        assert_eq!(data.net_pay, 2450.50);
        assert_eq!(data.employer.as_deref(), Some("Acme GmbH"));
    }

    #[tokio::test]
    async fn test_payslip_without_net_amount_fails_closed() {
        let extractor =
            extractor_with(r#"{"gross_pay": 3100.0, "employer": "Acme GmbH"}"#);
        let err = extractor.extract_payslip(b"%PDF-1.4 payslip").await.unwrap_err();
        assert!(matches!(err, Error::ModelOutputInvalid(_)));
    }

    #[tokio::test]
    async fn test_batch_drops_malformed_entry_keeps_rest() {
        // Nine valid transactions and one with a mistyped anchor.
        let mut entries: Vec<String> = (1..=9)
            .map(|i| format!(r#"{{"amount": -{}.0, "description": "TX {}"}}"#, i, i))
            .collect();
        entries.insert(4, r#"{"amount": "n/a", "description": "BROKEN"}"#.to_string());
        let response = format!("[{}]", entries.join(","));

        let extractor = extractor_with(&response);
        let transactions = extractor.extract_statement(b"%PDF-1.4 statement").await.unwrap();
        assert_eq!(transactions.len(), 9);
        assert!(transactions.iter().all(|t| t.description.as_deref() != Some("BROKEN")));
    }

    #[tokio::test]
    async fn test_unavailable_backend_propagates() {
        let extractor = Extractor::new(AIClient::Mock(MockBackend::failing()));
        let err = extractor.extract_payslip(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_non_json_response_is_model_output_invalid() {
        let extractor = extractor_with("I'm sorry, I can't read this document.");
        let err = extractor.extract_payslip(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, Error::ModelOutputInvalid(_)));
    }

    #[tokio::test]
    async fn test_statement_sign_conventions_survive() {
        let extractor = Extractor::new(AIClient::mock());
        let transactions = extractor.extract_statement(b"%PDF-1.4 statement").await.unwrap();
        assert!(transactions.iter().any(|t| t.amount < 0.0));
        assert!(transactions.iter().any(|t| t.amount > 0.0));
    }
}
