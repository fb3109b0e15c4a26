use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Caregiver => "caregiver",
});

str_enum!(PermissionLevel {
    Read => "read",
    Write => "write",
    Admin => "admin",
});

impl PermissionLevel {
    /// Position in the total order read < write < admin.
    fn rank(&self) -> u8 {
        match self {
            PermissionLevel::Read => 0,
            PermissionLevel::Write => 1,
            PermissionLevel::Admin => 2,
        }
    }

    /// A level satisfies every requirement at or below its own rank,
    /// so admin implies write implies read.
    pub fn satisfies(&self, required: PermissionLevel) -> bool {
        self.rank() >= required.rank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trip() {
        for (variant, s) in [(Role::Patient, "patient"), (Role::Caregiver, "caregiver")] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Role::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn permission_level_round_trip() {
        for (variant, s) in [
            (PermissionLevel::Read, "read"),
            (PermissionLevel::Write, "write"),
            (PermissionLevel::Admin, "admin"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(PermissionLevel::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn unknown_enum_value_rejected() {
        assert!(Role::from_str("admin").is_err());
        assert!(PermissionLevel::from_str("owner").is_err());
    }

    #[test]
    fn permission_levels_are_totally_ordered() {
        use PermissionLevel::*;
        assert!(Read.satisfies(Read));
        assert!(!Read.satisfies(Write));
        assert!(!Read.satisfies(Admin));
        assert!(Write.satisfies(Read));
        assert!(Write.satisfies(Write));
        assert!(!Write.satisfies(Admin));
        assert!(Admin.satisfies(Read));
        assert!(Admin.satisfies(Write));
        assert!(Admin.satisfies(Admin));
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Patient).unwrap(), "\"patient\"");
        assert_eq!(
            serde_json::from_str::<PermissionLevel>("\"write\"").unwrap(),
            PermissionLevel::Write
        );
    }
}
