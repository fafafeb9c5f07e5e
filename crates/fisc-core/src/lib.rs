//! Fisc Core Library
//!
//! Shared functionality for the Fisc personal finance application:
//! - Ability engine: role-based permission rules with a `can` query
//! - Structured extraction pipeline: schema-validated model output
//! - Budget advisor: best-effort spending caps from expense history
//! - Document store: generic JSON read/write over SQLite
//! - Payment gateway client for plan checkout
//! - Pluggable model backends (Ollama, OpenAI-compatible, mock)

pub mod ability;
pub mod ai;
pub mod budget;
pub mod error;
pub mod extract;
pub mod models;
pub mod payments;
pub mod prompts;
pub mod store;

pub use ability::{AbilitySet, Action, Effect, Rule, SubjectKind, SubjectRef};
pub use ai::{AIClient, MediaPayload, MockBackend, ModelBackend, OllamaBackend, OpenAICompatibleBackend};
pub use budget::BudgetAdvisor;
pub use error::{Error, Result};
pub use extract::schema::{payslip_schema, transaction_schema, FieldKind, FieldSpec, RecordSchema};
pub use extract::Extractor;
pub use models::{
    AppUser, BudgetSuggestion, Course, Debt, Expense, Income, PayslipData, Plan, Role,
    SavingsGoal, StatementTransaction, Subscription, UserStatus,
};
pub use payments::{CheckoutClient, CheckoutPreference};
pub use store::{Document, Store};
