//! Ability engine: role-based permission rules
//!
//! Computes, for a given authenticated principal, the set of actions
//! permitted on subjects, and answers `can(action, subject, field)`
//! queries. The rule set is a pure function of the principal (role and
//! id): no I/O, no hidden state. Callers recompute it whenever the
//! principal reference changes.
//!
//! Evaluation picks the most specific matching rule (field-qualified
//! rules outrank subject-only rules); at equal specificity a Deny wins.
//! Unknown subjects and actions evaluate to "not permitted".

use serde_json::{Map, Value};

use crate::models::{AppUser, Role};

/// Action requested on a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Any action. Only meaningful inside rules; a `Manage` rule
    /// matches every queried action.
    Manage,
}

impl Action {
    fn covers(self, queried: Action) -> bool {
        self == Action::Manage || self == queried
    }
}

/// Subject (resource) types known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    /// Any subject. Only meaningful inside rules.
    All,
    User,
    Expense,
    Income,
    Debt,
    SavingsGoal,
    Subscription,
    Plan,
    Course,
}

impl SubjectKind {
    fn covers(self, queried: SubjectKind) -> bool {
        self == SubjectKind::All || self == queried
    }
}

/// A subject reference in a `can` query: the subject type, optionally
/// with the candidate record's attributes for condition evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SubjectRef<'a> {
    pub kind: SubjectKind,
    pub record: Option<&'a Map<String, Value>>,
}

impl<'a> SubjectRef<'a> {
    /// Type-level reference (no record attributes)
    pub fn kind(kind: SubjectKind) -> Self {
        Self { kind, record: None }
    }

    /// Reference to a concrete record
    pub fn record(kind: SubjectKind, attrs: &'a Map<String, Value>) -> Self {
        Self {
            kind,
            record: Some(attrs),
        }
    }
}

/// Whether a rule grants or forbids its scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Grant,
    Deny,
}

/// A declarative permission rule
///
/// `fields` limits the rule to specific record fields; `condition` is a
/// predicate map that must match the candidate record's attributes
/// exactly (e.g. `{"id": principal.id}` for self-scope).
#[derive(Debug, Clone)]
pub struct Rule {
    pub effect: Effect,
    pub action: Action,
    pub subject: SubjectKind,
    pub fields: Option<Vec<String>>,
    pub condition: Option<Map<String, Value>>,
}

impl Rule {
    fn grant(action: Action, subject: SubjectKind) -> Self {
        Self {
            effect: Effect::Grant,
            action,
            subject,
            fields: None,
            condition: None,
        }
    }

    fn deny(action: Action, subject: SubjectKind) -> Self {
        Self {
            effect: Effect::Deny,
            action,
            subject,
            fields: None,
            condition: None,
        }
    }

    fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }

    fn with_condition(mut self, condition: Map<String, Value>) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Does this rule apply to the query at all?
    fn matches(&self, action: Action, subject: SubjectRef<'_>, field: Option<&str>) -> bool {
        if !self.action.covers(action) || !self.subject.covers(subject.kind) {
            return false;
        }

        // Field-qualified rules only apply to field-qualified queries.
        if let Some(ref fields) = self.fields {
            match field {
                Some(f) => {
                    if !fields.iter().any(|rf| rf == f) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        // Conditioned rules need record attributes that satisfy the
        // predicate map; a type-only query never matches them.
        if let Some(ref condition) = self.condition {
            match subject.record {
                Some(attrs) => condition
                    .iter()
                    .all(|(key, expected)| attrs.get(key) == Some(expected)),
                None => false,
            }
        } else {
            true
        }
    }

    /// Field-qualified rules outrank subject-only rules.
    fn specificity(&self) -> u8 {
        if self.fields.is_some() {
            1
        } else {
            0
        }
    }
}

fn self_condition(key: &str, id: i64) -> Map<String, Value> {
    let mut condition = Map::new();
    condition.insert(key.to_string(), Value::from(id));
    condition
}

/// Personal record collections owned per user
const OWNED_SUBJECTS: [SubjectKind; 5] = [
    SubjectKind::Expense,
    SubjectKind::Income,
    SubjectKind::Debt,
    SubjectKind::SavingsGoal,
    SubjectKind::Subscription,
];

/// The computed ability set for one principal snapshot
#[derive(Debug, Clone, Default)]
pub struct AbilitySet {
    rules: Vec<Rule>,
}

impl AbilitySet {
    /// Compute the rule set for a principal. Pure and deterministic:
    /// the result depends only on the principal's role and id.
    pub fn for_user(user: Option<&AppUser>) -> Self {
        let user = match user {
            Some(u) => u,
            // No principal: nothing is permitted.
            None => return Self::default(),
        };

        let mut rules = vec![Rule::grant(Action::Read, SubjectKind::All)];

        match user.role {
            Role::Superadmin => {
                rules.push(Rule::grant(Action::Manage, SubjectKind::All));
                // Even a superadmin cannot delete themselves or touch
                // their own role/status.
                rules.push(
                    Rule::deny(Action::Delete, SubjectKind::User)
                        .with_condition(self_condition("id", user.id)),
                );
                rules.push(
                    Rule::deny(Action::Update, SubjectKind::User)
                        .with_fields(&["role", "status"])
                        .with_condition(self_condition("id", user.id)),
                );
            }
            Role::User => {
                rules.push(
                    Rule::grant(Action::Manage, SubjectKind::User)
                        .with_condition(self_condition("id", user.id)),
                );
                for subject in OWNED_SUBJECTS {
                    rules.push(
                        Rule::grant(Action::Manage, subject)
                            .with_condition(self_condition("owner_id", user.id)),
                    );
                }
                // Role and status are never self-serviceable, and user
                // records cannot be deleted in-band at all.
                rules.push(
                    Rule::deny(Action::Update, SubjectKind::User)
                        .with_fields(&["role", "status"]),
                );
                rules.push(Rule::deny(Action::Delete, SubjectKind::User));
            }
        }

        Self { rules }
    }

    /// Evaluate a permission query. Never panics; anything the rules do
    /// not cover is denied.
    pub fn can(&self, action: Action, subject: SubjectRef<'_>, field: Option<&str>) -> bool {
        let matching: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(action, subject, field))
            .collect();

        let Some(top) = matching.iter().map(|rule| rule.specificity()).max() else {
            return false;
        };

        // Deny beats Grant at the winning specificity.
        matching
            .iter()
            .filter(|rule| rule.specificity() == top)
            .all(|rule| rule.effect == Effect::Grant)
    }

    /// Convenience inverse of [`can`](Self::can)
    pub fn cannot(&self, action: Action, subject: SubjectRef<'_>, field: Option<&str>) -> bool {
        !self.can(action, subject, field)
    }

    /// The underlying rules, in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;
    use chrono::Utc;
    use serde_json::json;

    fn user(id: i64, role: Role) -> AppUser {
        AppUser {
            id,
            email: format!("u{}@example.com", id),
            display_name: format!("User {}", id),
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_no_principal_denies_everything() {
        let abilities = AbilitySet::for_user(None);
        for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
            for kind in [SubjectKind::User, SubjectKind::Expense, SubjectKind::Plan] {
                assert!(!abilities.can(action, SubjectRef::kind(kind), None));
            }
        }
    }

    #[test]
    fn test_any_principal_can_read_everything() {
        let u = user(1, Role::User);
        let abilities = AbilitySet::for_user(Some(&u));
        for kind in [
            SubjectKind::User,
            SubjectKind::Expense,
            SubjectKind::Plan,
            SubjectKind::Course,
        ] {
            assert!(abilities.can(Action::Read, SubjectRef::kind(kind), None));
        }
    }

    #[test]
    fn test_regular_user_manages_own_record_but_not_role_or_status() {
        let u = user(7, Role::User);
        let abilities = AbilitySet::for_user(Some(&u));
        let own = attrs(json!({"id": 7}));

        let own_ref = SubjectRef::record(SubjectKind::User, &own);
        assert!(abilities.can(Action::Update, own_ref, Some("display_name")));
        assert!(abilities.can(Action::Update, own_ref, Some("email")));
        assert!(!abilities.can(Action::Update, own_ref, Some("role")));
        assert!(!abilities.can(Action::Update, own_ref, Some("status")));
    }

    #[test]
    fn test_regular_user_cannot_touch_other_users() {
        let u = user(7, Role::User);
        let abilities = AbilitySet::for_user(Some(&u));
        let other = attrs(json!({"id": 8}));

        let other_ref = SubjectRef::record(SubjectKind::User, &other);
        assert!(!abilities.can(Action::Update, other_ref, Some("display_name")));
        assert!(!abilities.can(Action::Delete, other_ref, None));
        // Read is still permitted (grant on every subject).
        assert!(abilities.can(Action::Read, other_ref, None));
    }

    #[test]
    fn test_regular_user_cannot_delete_self() {
        let u = user(7, Role::User);
        let abilities = AbilitySet::for_user(Some(&u));
        let own = attrs(json!({"id": 7}));
        assert!(!abilities.can(Action::Delete, SubjectRef::record(SubjectKind::User, &own), None));
    }

    #[test]
    fn test_superadmin_manages_others_but_not_self_deletion() {
        let u = user(1, Role::Superadmin);
        let abilities = AbilitySet::for_user(Some(&u));
        let own = attrs(json!({"id": 1}));
        let other = attrs(json!({"id": 2}));

        assert!(!abilities.can(Action::Delete, SubjectRef::record(SubjectKind::User, &own), None));
        assert!(abilities.can(Action::Delete, SubjectRef::record(SubjectKind::User, &other), None));
    }

    #[test]
    fn test_superadmin_cannot_alter_own_role_or_status() {
        let u = user(1, Role::Superadmin);
        let abilities = AbilitySet::for_user(Some(&u));
        let own = attrs(json!({"id": 1}));
        let other = attrs(json!({"id": 2}));

        let own_ref = SubjectRef::record(SubjectKind::User, &own);
        assert!(!abilities.can(Action::Update, own_ref, Some("role")));
        assert!(!abilities.can(Action::Update, own_ref, Some("status")));
        assert!(abilities.can(Action::Update, own_ref, Some("display_name")));

        let other_ref = SubjectRef::record(SubjectKind::User, &other);
        assert!(abilities.can(Action::Update, other_ref, Some("role")));
        assert!(abilities.can(Action::Update, other_ref, Some("status")));
    }

    #[test]
    fn test_superadmin_manages_admin_collections() {
        let u = user(1, Role::Superadmin);
        let abilities = AbilitySet::for_user(Some(&u));
        assert!(abilities.can(Action::Create, SubjectRef::kind(SubjectKind::Plan), None));
        assert!(abilities.can(Action::Delete, SubjectRef::kind(SubjectKind::Course), None));
    }

    #[test]
    fn test_regular_user_owned_record_scope() {
        let u = user(7, Role::User);
        let abilities = AbilitySet::for_user(Some(&u));
        let own = attrs(json!({"owner_id": 7}));
        let other = attrs(json!({"owner_id": 8}));

        assert!(abilities.can(Action::Create, SubjectRef::record(SubjectKind::Expense, &own), None));
        assert!(abilities.can(Action::Delete, SubjectRef::record(SubjectKind::Expense, &own), None));
        assert!(!abilities.can(Action::Update, SubjectRef::record(SubjectKind::Expense, &other), None));
        // Admin collections remain read-only for regular users.
        assert!(!abilities.can(Action::Create, SubjectRef::kind(SubjectKind::Plan), None));
    }

    #[test]
    fn test_type_only_query_skips_conditioned_grants() {
        let u = user(7, Role::User);
        let abilities = AbilitySet::for_user(Some(&u));
        // Without record attributes the self-scoped manage grant does
        // not apply, and deny-by-default holds.
        assert!(!abilities.can(Action::Update, SubjectRef::kind(SubjectKind::User), None));
    }

    #[test]
    fn test_determinism_for_same_principal() {
        let u = user(3, Role::User);
        let a = AbilitySet::for_user(Some(&u));
        let b = AbilitySet::for_user(Some(&u));
        assert_eq!(a.rules().len(), b.rules().len());
        let own = attrs(json!({"id": 3}));
        assert_eq!(
            a.can(Action::Update, SubjectRef::record(SubjectKind::User, &own), Some("role")),
            b.can(Action::Update, SubjectRef::record(SubjectKind::User, &own), Some("role")),
        );
    }
}
