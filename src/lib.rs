//! Filter-and-aggregate pipeline behind the forced-displacement dashboard.
//!
//! Data flows one way:
//!
//! ```text
//!  CSV file --loader--> Dataset --filter--> Dataset --aggregate--> rows
//!                          ^                                        |
//!                      DataStore                        reports / output
//! ```
//!
//! Datasets are read-only once loaded; every step returns new values.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod reports;
pub mod store;
pub mod types;
pub mod util;

pub use error::{ExportError, LoadError, SchemaError};
pub use filter::{filter, FilterCriteria, Selection};
pub use store::DataStore;
pub use types::{AggregateRow, Cell, Dataset};
