//! Shared data models
//!
//! Stored records are kept as JSON documents in the document store; the
//! typed structs here are the projections handlers and the extraction
//! pipeline work with.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Role of an authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Superadmin => "superadmin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account status of a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "suspended" => Ok(UserStatus::Suspended),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

/// Authenticated principal
///
/// A read-mostly projection of the identity held by the authentication
/// provider. Created on first sign-in, updated on profile edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

/// An expense record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: Option<i64>,
    pub owner_id: i64,
    pub category: String,
    pub description: String,
    /// Always negative (debit convention)
    pub amount: f64,
    pub date: NaiveDate,
}

/// An income record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    #[serde(default)]
    pub id: Option<i64>,
    pub owner_id: i64,
    pub source: String,
    /// Always positive (credit convention)
    pub amount: f64,
    pub date: NaiveDate,
}

/// A tracked debt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    #[serde(default)]
    pub id: Option<i64>,
    pub owner_id: i64,
    pub creditor: String,
    pub balance: f64,
    #[serde(default)]
    pub interest_rate: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// A savings goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    #[serde(default)]
    pub id: Option<i64>,
    pub owner_id: i64,
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

/// A recurring subscription tracked by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub id: Option<i64>,
    pub owner_id: i64,
    pub service: String,
    pub monthly_amount: f64,
    #[serde(default)]
    pub next_billing_date: Option<NaiveDate>,
}

/// A purchasable subscription plan (admin-managed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub description: String,
}

/// Educational content (admin-managed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    pub summary: String,
    pub url: String,
    #[serde(default)]
    pub published: bool,
}

/// Structured data extracted from a payslip PDF
///
/// `net_pay` is the anchor field: extraction without it is rejected
/// outright rather than returned partially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipData {
    pub net_pay: f64,
    #[serde(default)]
    pub gross_pay: Option<f64>,
    #[serde(default)]
    pub employer: Option<String>,
    #[serde(default)]
    pub pay_date: Option<NaiveDate>,
    #[serde(default)]
    pub deductions: Option<f64>,
}

/// A single transaction extracted from a bank statement
///
/// Sign convention: debits negative, credits positive. `amount` is the
/// anchor field for batch extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub amount: f64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// A model-proposed monthly spending cap for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSuggestion {
    pub category: String,
    pub monthly_limit: f64,
    pub justification: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::Superadmin);
        assert_eq!(Role::User.as_str(), "user");
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_payslip_optional_fields_default() {
        let data: PayslipData = serde_json::from_str(r#"{"net_pay": 2450.0}"#).unwrap();
        assert_eq!(data.net_pay, 2450.0);
        assert!(data.employer.is_none());
        assert!(data.pay_date.is_none());
    }
}
