use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Fresh random identifier, unique across processes and restarts.
            pub(crate) fn next() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::new_v4()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

record_id!(
    /// Account identifier handed over by the identity resolver.
    PartyId,
    "party"
);
record_id!(ListingId, "lst");
record_id!(NdaRequestId, "nda");
record_id!(LoiId, "loi");
record_id!(TransactionId, "txn");
record_id!(MilestoneId, "ms");
record_id!(PaymentId, "pay");
record_id!(ActivityId, "act");
record_id!(DocumentId, "doc");
record_id!(AccessLogId, "acl");
record_id!(MessageId, "msg");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_carry_their_prefix_and_never_repeat() {
        let ids: HashSet<LoiId> = (0..1_000).map(|_| LoiId::next()).collect();
        assert_eq!(ids.len(), 1_000);

        let id = TransactionId::next();
        let suffix = id.as_str().strip_prefix("txn-").expect("prefixed");
        assert!(Uuid::parse_str(suffix).is_ok());
    }
}
