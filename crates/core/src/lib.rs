pub mod account;
pub mod amount;
pub mod timespan;
pub mod transaction;

pub use account::{AccountConfig, AccountType};
pub use amount::{parse_amount, to_minor_units, AmountError};
pub use timespan::DateRange;
pub use transaction::{import_id, CanonicalTransaction, RawTransaction};
