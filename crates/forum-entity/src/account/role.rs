//! Account roles.
//!
//! Roles are free-form strings owned by the permission layer; this crate
//! only gives names to the ones the maintenance reconciliation touches.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles with meaning inside this crate.
///
/// Operators may grant arbitrary additional role strings; those pass through
/// [`RoleSet`] untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Active paid supporter.
    Patron,
    /// Former supporter tier, granted permanently once a patronage lapses.
    Vip,
    /// Forum moderator.
    Moderator,
    /// Full administrator.
    Admin,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patron => "patron",
            Self::Vip => "vip",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = forum_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "patron" => Ok(Self::Patron),
            "vip" => Ok(Self::Vip),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            _ => Err(forum_core::AppError::validation(format!(
                "Unknown role: '{s}'. Expected one of: patron, vip, moderator, admin"
            ))),
        }
    }
}

/// An account's role membership.
///
/// A set of strings with idempotent insert/remove semantics. Membership is
/// what matters; insertion order does not, so the backing set is ordered for
/// a stable persisted representation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// Create an empty role set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the set contains the given role.
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(role.as_str())
    }

    /// Whether the set contains the given raw role string.
    pub fn contains_str(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Insert a role. Returns `true` if the set changed.
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role.as_str().to_string())
    }

    /// Insert a raw role string. Returns `true` if the set changed.
    pub fn insert_str(&mut self, role: impl Into<String>) -> bool {
        self.0.insert(role.into())
    }

    /// Remove a role. Returns `true` if the set changed.
    pub fn remove(&mut self, role: Role) -> bool {
        self.0.remove(role.as_str())
    }

    /// Number of roles held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no roles are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the role strings in stable order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The role strings in stable order, for persistence.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<String> for RoleSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<String>> for RoleSet {
    fn from(roles: Vec<String>) -> Self {
        roles.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("patron".parse::<Role>().unwrap(), Role::Patron);
        assert_eq!("VIP".parse::<Role>().unwrap(), Role::Vip);
        assert!("invalid".parse::<Role>().is_err());
    }

    #[test]
    fn test_idempotent_insert_remove() {
        let mut roles = RoleSet::new();
        assert!(roles.insert(Role::Patron));
        assert!(!roles.insert(Role::Patron));
        assert!(roles.contains(Role::Patron));
        assert!(roles.remove(Role::Patron));
        assert!(!roles.remove(Role::Patron));
        assert!(roles.is_empty());
    }

    #[test]
    fn test_preserves_operator_defined_roles() {
        let mut roles = RoleSet::from(vec!["founder".to_string(), "vip".to_string()]);
        roles.remove(Role::Vip);
        assert!(roles.contains_str("founder"));
        assert_eq!(roles.to_vec(), vec!["founder".to_string()]);
    }
}
