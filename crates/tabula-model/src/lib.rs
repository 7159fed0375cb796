//! `tabula-model` defines the typed-value layer of the tabula data library.
//!
//! Raw scalars are wrapped in self-describing values that carry a capability
//! contract: equality, ordering, and (for numeric kinds) arithmetic. The crate
//! is intentionally self-contained so it can be reused by:
//! - the series/statistics engine (`tabula-engine`)
//! - presentation layers via `serde` (JSON-safe payloads)

mod error;
pub mod signature;
mod temporal;
mod types;
mod unit;
mod value;

pub use error::ValueError;
pub use signature::{Signature, ValueClass};
pub use temporal::{duration, time_unit_table, Resolution, Time};
pub use types::{Kind, ValueType};
pub use unit::{Quantity, UnitTable};
pub use value::{approx_eq, Algebra, CategorySet, Ordered, Rankings, Value, EPSILON};
