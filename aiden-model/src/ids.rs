use serde::{Deserialize, Serialize};

/// Declares a strongly typed wrapper around a `BIGSERIAL` primary key.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Identifier of a single OSINT scan request.
    ScanId
);
row_id!(
    /// Identifier of one persisted finding row.
    FindingId
);
row_id!(EmployeeId);
row_id!(OrganisationId);
row_id!(UserId);
row_id!(
    /// Identifier of an immutable consent audit entry.
    ConsentId
);
row_id!(ScanEmailId);
