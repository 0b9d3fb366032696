//! Core abstractions shared by the comparators and the drivers.
//!
//! - [`schema`]: table, column and primary key metadata
//! - [`value`]: fetched cell values
//! - [`normalize`]: the equality rules applied to values and defaults
//! - [`row`]: row snapshots and primary-key tuples
//! - [`traits`]: metadata and data provider capabilities
//!
//! The comparators only talk to [`MetadataProvider`] and [`DataProvider`], so
//! they can be exercised against in-memory fixtures as easily as against a
//! live MySQL pair.

pub mod normalize;
pub mod row;
pub mod schema;
pub mod traits;
pub mod value;

pub use normalize::{
    display_default, normalize_default, normalize_value, values_equal, NormalizedValue,
};
pub use row::{format_key, RowKey, RowSnapshot, TableRows, KEY_DELIMITER};
pub use schema::{ColumnDescriptor, PrimaryKeySpec, TableName};
pub use traits::{DataProvider, Instance, MetadataProvider};
pub use value::SqlValue;
