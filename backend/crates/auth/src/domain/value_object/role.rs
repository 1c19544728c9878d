//! Role Value Object
//!
//! Fixed set of clinic roles, carried in the JWT `roles` claim.

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Clinic patient (default for self-registration)
    #[default]
    Patient,
    /// Practitioner
    Doctor,
    /// Administrator
    Admin,
}

impl Role {
    /// Database representation
    pub const fn id(&self) -> i16 {
        match self {
            Role::Patient => 0,
            Role::Doctor => 1,
            Role::Admin => 2,
        }
    }

    /// From database representation (unknown values fall back to Patient)
    pub const fn from_id(id: i16) -> Self {
        match id {
            1 => Role::Doctor,
            2 => Role::Admin,
            _ => Role::Patient,
        }
    }

    /// Claim string embedded in tokens
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Admin => "Admin",
        }
    }

    /// Parse a claim string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Patient" => Some(Role::Patient),
            "Doctor" => Some(Role::Doctor),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_id_roundtrip() {
        for role in [Role::Patient, Role::Doctor, Role::Admin] {
            assert_eq!(Role::from_id(role.id()), role);
        }
    }

    #[test]
    fn test_role_claim_roundtrip() {
        for role in [Role::Patient, Role::Doctor, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("SuperUser"), None);
    }

    #[test]
    fn test_unknown_id_defaults_to_patient() {
        assert_eq!(Role::from_id(99), Role::Patient);
    }
}
