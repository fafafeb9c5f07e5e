//! Prompt rendering for extraction and budget tasks
//!
//! Prompts are built from the declared output schema so the field
//! definitions in the instruction text and the validation step can
//! never drift apart. Formatting rules follow the data conventions:
//! dates as YYYY-MM-DD, debits negative, credits positive.

use crate::extract::schema::RecordSchema;
use crate::models::Expense;

/// Render the field-definition block for a schema
fn render_fields(schema: &RecordSchema) -> String {
    schema
        .fields
        .iter()
        .map(|field| {
            format!(
                "- \"{}\": {}{}",
                field.name,
                field.kind.describe(),
                if field.required { " (required)" } else { " (optional)" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for single-document extraction (e.g. a payslip PDF)
pub fn document_extraction_prompt(schema: &RecordSchema) -> String {
    format!(
        "You are given a financial document. Extract a single {name} record from it.\n\
         Respond with exactly one JSON object and no other text.\n\n\
         Fields:\n{fields}\n\n\
         Rules:\n\
         - Dates must be formatted as YYYY-MM-DD.\n\
         - Amounts are plain numbers without currency symbols.\n\
         - Omit a field entirely if the document does not contain it.\n\
         - Never invent values.",
        name = schema.name,
        fields = render_fields(schema),
    )
}

/// Prompt for batch extraction of statement transactions
pub fn statement_extraction_prompt(item_schema: &RecordSchema) -> String {
    format!(
        "You are given a bank statement. Extract every transaction in it.\n\
         Respond with exactly one JSON array of {name} objects and no other text.\n\n\
         Fields per object:\n{fields}\n\n\
         Rules:\n\
         - Dates must be formatted as YYYY-MM-DD.\n\
         - Debits (money leaving the account) are negative numbers.\n\
         - Credits (money entering the account) are positive numbers.\n\
         - Omit a field if the statement does not contain it.\n\
         - Never invent transactions.",
        name = item_schema.name,
        fields = render_fields(item_schema),
    )
}

/// Prompt asking for 2-3 budget caps based on spending history
pub fn budget_suggestion_prompt(expenses: &[Expense], averages: &[(String, f64)]) -> String {
    let history = averages
        .iter()
        .map(|(category, avg)| format!("- {}: average {:.2}/month", category, avg))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a budget advisor. Based on {count} expense records across these \
         categories:\n{history}\n\n\
         Propose 2 to 3 budget caps. Respond with exactly one JSON array and no other \
         text. Each element:\n\
         - \"category\": string, one of the categories above\n\
         - \"monthly_limit\": number, below that category's current monthly average\n\
         - \"justification\": string, one short sentence\n\n\
         Pick categories where spending is most discretionary.",
        count = expenses.len(),
        history = history,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::schema::{payslip_schema, transaction_schema};

    #[test]
    fn test_document_prompt_lists_all_fields() {
        let prompt = document_extraction_prompt(&payslip_schema());
        assert!(prompt.contains("\"net_pay\""));
        assert!(prompt.contains("(required)"));
        assert!(prompt.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_statement_prompt_states_sign_convention() {
        let prompt = statement_extraction_prompt(&transaction_schema());
        assert!(prompt.contains("negative"));
        assert!(prompt.contains("positive"));
        assert!(prompt.contains("\"amount\""));
    }
}
