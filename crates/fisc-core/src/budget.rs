//! Budget advisor
//!
//! Best-effort layer on top of the model backend: given enough expense
//! history it asks for 2-3 category caps below the current average.
//! "No suggestion" is a normal, silent outcome — callers must treat
//! `None` as such, never as a failure to surface to the user.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::ai::{parsing, AIClient, ModelBackend};
use crate::extract::schema::budget_suggestion_schema;
use crate::models::{BudgetSuggestion, Expense};
use crate::prompts;

/// Minimum number of expense records before the backend is consulted
pub const MIN_SAMPLE_SIZE: usize = 5;

/// Maximum number of suggestions ever returned
pub const MAX_SUGGESTIONS: usize = 3;

/// Categories with fixed, non-discretionary spending. Capping these is
/// not actionable advice, so they are excluded up front.
const FIXED_CATEGORIES: [&str; 6] = [
    "rent",
    "mortgage",
    "insurance",
    "utilities",
    "taxes",
    "loan payment",
];

/// Budget advisor over one model client
#[derive(Clone)]
pub struct BudgetAdvisor {
    client: AIClient,
}

impl BudgetAdvisor {
    pub fn new(client: AIClient) -> Self {
        Self { client }
    }

    /// Propose monthly budget caps from expense history.
    ///
    /// Returns `None` (without calling the backend) when fewer than
    /// [`MIN_SAMPLE_SIZE`] expenses are supplied, and `None` when fewer
    /// than two usable suggestions come back. Backend and parse
    /// failures are swallowed to `None` with a log line.
    pub async fn suggest(&self, expenses: &[Expense]) -> Option<Vec<BudgetSuggestion>> {
        if expenses.len() < MIN_SAMPLE_SIZE {
            debug!(
                count = expenses.len(),
                "Not enough expense history for budget suggestions"
            );
            return None;
        }

        let averages = category_averages(expenses);
        if averages.is_empty() {
            debug!("No discretionary categories in expense history");
            return None;
        }

        let prompt = prompts::budget_suggestion_prompt(expenses, &averages);
        let response = match self.client.generate(&prompt, None).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Budget suggestion backend call failed");
                return None;
            }
        };

        let candidates = match parsing::extract_json_array(&response) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Budget suggestion response was not parseable");
                return None;
            }
        };

        let schema = budget_suggestion_schema();
        let suggestions: Vec<BudgetSuggestion> = candidates
            .iter()
            .filter_map(|candidate| schema.validate_record(candidate).ok())
            .filter_map(|record| {
                serde_json::from_value::<BudgetSuggestion>(serde_json::Value::Object(record)).ok()
            })
            .filter(|s| s.monthly_limit > 0.0 && !s.justification.trim().is_empty())
            .map(|mut s| {
                s.monthly_limit = round_to_friendly(s.monthly_limit);
                s
            })
            // Checked after rounding so a cap can never round up past
            // the average it is supposed to sit below.
            .filter(|s| caps_below_average(s, &averages))
            .take(MAX_SUGGESTIONS)
            .collect();

        // A single cap is not a budget plan; below two we stay silent.
        if suggestions.len() < 2 {
            debug!(count = suggestions.len(), "Too few usable budget suggestions");
            return None;
        }

        Some(suggestions)
    }
}

/// Monthly average spend per discretionary category, sorted by name
fn category_averages(expenses: &[Expense]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for expense in expenses {
        if is_fixed_category(&expense.category) {
            continue;
        }
        let entry = totals.entry(expense.category.clone()).or_insert((0.0, 0));
        entry.0 += expense.amount.abs();
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(category, (total, count))| (category, total / count.max(1) as f64))
        .collect()
}

fn is_fixed_category(category: &str) -> bool {
    let lower = category.to_lowercase();
    FIXED_CATEGORIES.iter().any(|fixed| lower.contains(fixed))
}

/// A usable suggestion names a known category and caps below its
/// current monthly average.
fn caps_below_average(suggestion: &BudgetSuggestion, averages: &[(String, f64)]) -> bool {
    averages
        .iter()
        .any(|(category, avg)| category == &suggestion.category && suggestion.monthly_limit < *avg)
}

/// Round a cap to a user-friendly increment: nearest 10 above 100,
/// nearest 5 otherwise (never rounding down to zero).
fn round_to_friendly(limit: f64) -> f64 {
    let increment = if limit >= 100.0 { 10.0 } else { 5.0 };
    let rounded = (limit / increment).round() * increment;
    if rounded <= 0.0 {
        increment
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use chrono::NaiveDate;

    fn expense(category: &str, amount: f64) -> Expense {
        Expense {
            id: None,
            owner_id: 1,
            category: category.to_string(),
            description: format!("{} purchase", category),
            amount,
            date: NaiveDate::from_ymd_opt(2026, 7, 15).unwrap(),
        }
    }

    fn history() -> Vec<Expense> {
        vec![
            expense("Dining", -80.0),
            expense("Dining", -320.0),
            expense("Shopping", -150.0),
            expense("Shopping", -170.0),
            expense("Groceries", -95.0),
            expense("Rent", -1200.0),
        ]
    }

    #[tokio::test]
    async fn test_below_sample_threshold_skips_backend() {
        let mock = MockBackend::new();
        let advisor = BudgetAdvisor::new(AIClient::Mock(mock.clone()));
        let result = advisor.suggest(&history()[..4]).await;
        assert!(result.is_none());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_qualifying_history_returns_bounded_suggestions() {
        let advisor = BudgetAdvisor::new(AIClient::mock());
        let suggestions = advisor.suggest(&history()).await.unwrap();
        assert!((2..=3).contains(&suggestions.len()));
        for s in &suggestions {
            assert!(s.monthly_limit > 0.0);
            assert!(!s.justification.trim().is_empty());
        }
    }

    #[tokio::test]
    async fn test_backend_failure_swallowed_to_none() {
        let advisor = BudgetAdvisor::new(AIClient::Mock(MockBackend::failing()));
        assert!(advisor.suggest(&history()).await.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_response_swallowed_to_none() {
        let advisor = BudgetAdvisor::new(AIClient::Mock(MockBackend::with_response(
            "no budget ideas today",
        )));
        assert!(advisor.suggest(&history()).await.is_none());
    }

    #[tokio::test]
    async fn test_single_usable_suggestion_yields_none() {
        // Only one element survives validation (the second caps above
        // the category average and is discarded).
        let response = r#"[
            {"category": "Dining", "monthly_limit": 150.0, "justification": "High discretionary spend"},
            {"category": "Groceries", "monthly_limit": 500.0, "justification": "Cap above average"}
        ]"#;
        let advisor = BudgetAdvisor::new(AIClient::Mock(MockBackend::with_response(response)));
        assert!(advisor.suggest(&history()).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_category_discarded() {
        let response = r#"[
            {"category": "Yachts", "monthly_limit": 50.0, "justification": "n/a"},
            {"category": "Dining", "monthly_limit": 150.0, "justification": "High spend"},
            {"category": "Shopping", "monthly_limit": 120.0, "justification": "Impulse buys"}
        ]"#;
        let advisor = BudgetAdvisor::new(AIClient::Mock(MockBackend::with_response(response)));
        let suggestions = advisor.suggest(&history()).await.unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| s.category != "Yachts"));
    }

    #[tokio::test]
    async fn test_rounded_cap_never_exceeds_category_average() {
        // Averages of 118; the proposed 117 caps round up to 120 and
        // must be discarded, leaving nothing to suggest.
        let mut expenses: Vec<Expense> = (0..3).map(|_| expense("Dining", -118.0)).collect();
        expenses.extend((0..3).map(|_| expense("Shopping", -118.0)));

        let response = r#"[
            {"category": "Dining", "monthly_limit": 117.0, "justification": "Trim slightly"},
            {"category": "Shopping", "monthly_limit": 117.0, "justification": "Trim slightly"}
        ]"#;
        let advisor = BudgetAdvisor::new(AIClient::Mock(MockBackend::with_response(response)));
        assert!(advisor.suggest(&expenses).await.is_none());
    }

    #[tokio::test]
    async fn test_non_positive_limit_discarded_before_rounding() {
        // A negative cap must not be rescued by the never-zero rounding
        // clamp.
        let response = r#"[
            {"category": "Dining", "monthly_limit": -50.0, "justification": "Broken"},
            {"category": "Shopping", "monthly_limit": 120.0, "justification": "Impulse buys"},
            {"category": "Groceries", "monthly_limit": 60.0, "justification": "Meal planning"}
        ]"#;
        let advisor = BudgetAdvisor::new(AIClient::Mock(MockBackend::with_response(response)));
        let suggestions = advisor.suggest(&history()).await.unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| s.category != "Dining"));
    }

    #[test]
    fn test_fixed_categories_excluded_from_averages() {
        let averages = category_averages(&history());
        assert!(averages.iter().all(|(c, _)| c != "Rent"));
        assert!(averages.iter().any(|(c, _)| c == "Dining"));
    }

    #[test]
    fn test_friendly_rounding() {
        assert_eq!(round_to_friendly(183.0), 180.0);
        assert_eq!(round_to_friendly(47.3), 45.0);
        assert_eq!(round_to_friendly(1.0), 5.0);
        assert_eq!(round_to_friendly(98.0), 100.0);
    }
}
