//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ReceiptId` where an `InvoiceId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(PaymentId, "Unique identifier for a payment.");
typed_id!(ReceiptId, "Unique identifier for a sales receipt.");
typed_id!(InvoiceId, "Unique identifier for an invoice.");
typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(SupplierId, "Unique identifier for a supplier.");
typed_id!(
    InventoryEntryId,
    "Unique identifier for an inventory entry (purchase or movement)."
);
typed_id!(PayrollEntryId, "Unique identifier for a payroll entry.");
typed_id!(DebrisEntryId, "Unique identifier for a debris entry.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_ids_are_v7() {
        let id = PaymentId::new();
        assert_eq!(id.into_inner().get_version_num(), 7);
    }

    #[test]
    fn test_from_str_roundtrip() {
        let id = ReceiptId::new();
        let parsed = ReceiptId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!(CustomerId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let uuid = Uuid::now_v7();
        let id = SupplierId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
