use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Role is a reader's privilege tier. Variants are declared lowest to highest
/// and the derived ordering follows the explicit rank.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Role {
    #[default]
    Seeker = 0,
    Initiate = 1,
    VeilBearer = 2,
    FlameDisciple = 3,
    NameGuardian = 4,
    FallHerald = 5,
    CrownBearer = 6,
    SupremeMagus = 7,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Seeker,
        Role::Initiate,
        Role::VeilBearer,
        Role::FlameDisciple,
        Role::NameGuardian,
        Role::FallHerald,
        Role::CrownBearer,
        Role::SupremeMagus,
    ];

    /// The role administrative endpoints require.
    pub const ADMIN: Role = Role::SupremeMagus;

    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Seeker => "seeker",
            Role::Initiate => "initiate",
            Role::VeilBearer => "veil-bearer",
            Role::FlameDisciple => "flame-disciple",
            Role::NameGuardian => "name-guardian",
            Role::FallHerald => "fall-herald",
            Role::CrownBearer => "crown-bearer",
            Role::SupremeMagus => "supreme-magus",
        }
    }

    /// Converts a role name to its variant.
    pub fn parse(s: &str) -> Result<Role> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::RoleNotRecognized(s.to_string()))
    }

    /// Returns true if a holder of this role may see content requiring `required`.
    #[must_use]
    pub const fn has_access(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        self.has_access(Self::ADMIN)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::parse(s)
    }
}

/// Linear hierarchy check: any role at or above `required` is granted.
#[must_use]
pub const fn has_access(user: Role, required: Role) -> bool {
    user.has_access(required)
}

/// String-level access check for untyped input.
/// An unrecognized name on either side denies access.
#[must_use]
pub fn has_access_by_name(user: &str, required: &str) -> bool {
    match (Role::parse(user), Role::parse(required)) {
        (Ok(user), Ok(required)) => user.has_access(required),
        (Err(e), _) | (_, Err(e)) => {
            tracing::debug!("Denying access: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_access_follows_rank() {
        for a in Role::ALL {
            for b in Role::ALL {
                assert_eq!(has_access(a, b), a.rank() >= b.rank(), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_has_access_reflexive() {
        for r in Role::ALL {
            assert!(has_access(r, r));
        }
    }

    #[test]
    fn test_one_step_below_denied() {
        assert!(!has_access(Role::FallHerald, Role::CrownBearer));
        assert!(has_access(Role::SupremeMagus, Role::Seeker));
    }

    #[test]
    fn test_unrecognized_role_denied() {
        for r in Role::ALL {
            assert!(!has_access_by_name("archon", r.as_str()));
        }
        assert!(!has_access_by_name("supreme-magus", "archon"));
        assert!(!has_access_by_name("", "seeker"));
    }

    #[test]
    fn test_initiate_against_course_tiers() {
        assert!(!has_access_by_name("initiate", "supreme-magus"));
        assert!(has_access_by_name("initiate", "seeker"));
    }

    #[test]
    fn test_parse_roundtrips_names() {
        assert_eq!(Role::parse("veil-bearer").unwrap(), Role::VeilBearer);
        assert!(matches!(
            Role::parse("Veil-Bearer"),
            Err(Error::RoleNotRecognized(_))
        ));
        assert_eq!(
            serde_json::to_string(&Role::NameGuardian).unwrap(),
            "\"name-guardian\""
        );
    }

    #[test]
    fn test_only_supreme_magus_is_admin() {
        let admins: Vec<Role> = Role::ALL.into_iter().filter(|r| r.is_admin()).collect();
        assert_eq!(admins, vec![Role::SupremeMagus]);
    }
}
