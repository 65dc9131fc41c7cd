//! Canonical string encoding of chaincode arguments.
//!
//! Chaincode functions take every argument as a string, so every value that
//! crosses the ledger boundary goes through [`LedgerArg::encode`]. The forms
//! below are part of the wire contract:
//!
//! | Type                  | Encoding                                  |
//! |-----------------------|-------------------------------------------|
//! | `str` / `String`      | verbatim                                  |
//! | `Uuid` / `RecordId`   | hyphenated lowercase                      |
//! | integers              | base 10, no padding                       |
//! | `f64`                 | shortest round-trip form (`21.5`, `3`)    |
//! | `bool`                | `true` / `false`                          |
//! | `DateTime<Utc>`       | RFC 3339, second precision, `Z` suffix    |
//! | `Option<T>`           | `None` as the empty string                |

use agritrack_sync_store::RecordId;
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A value with a canonical chaincode argument form.
pub trait LedgerArg {
    /// Returns the argument string sent to the ledger.
    fn encode(&self) -> String;
}

impl LedgerArg for str {
    fn encode(&self) -> String {
        self.to_owned()
    }
}

impl LedgerArg for String {
    fn encode(&self) -> String {
        self.clone()
    }
}

impl<T: LedgerArg + ?Sized> LedgerArg for &T {
    fn encode(&self) -> String {
        (**self).encode()
    }
}

impl LedgerArg for Uuid {
    fn encode(&self) -> String {
        self.hyphenated().to_string()
    }
}

impl LedgerArg for RecordId {
    fn encode(&self) -> String {
        self.0.encode()
    }
}

macro_rules! impl_display_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LedgerArg for $ty {
                fn encode(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_display_arg!(u32, u64, usize, i32, i64, bool);

impl LedgerArg for f64 {
    fn encode(&self) -> String {
        // Display is the shortest representation that parses back exactly
        self.to_string()
    }
}

impl LedgerArg for DateTime<Utc> {
    fn encode(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl<T: LedgerArg> LedgerArg for Option<T> {
    fn encode(&self) -> String {
        self.as_ref().map(LedgerArg::encode).unwrap_or_default()
    }
}

/// Encodes a list of values into an ordered argument vector.
///
/// ```
/// use agritrack_ledger_sync::ledger_args;
///
/// let args = ledger_args!["B-1", 42_u32, true, None::<f64>];
/// assert_eq!(args, vec!["B-1", "42", "true", ""]);
/// ```
#[macro_export]
macro_rules! ledger_args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::codec::LedgerArg::encode(&$arg)),*]
    };
}
