//! Database driver implementations of the provider traits.
//!
//! - [`mysql`]: MySQL/MariaDB over SQLx
//!
//! A driver implements [`crate::core::MetadataProvider`] and
//! [`crate::core::DataProvider`] for a pair of instances; the comparison
//! engine is generic over both traits and never sees the driver types.

pub mod mysql;

pub use mysql::{MysqlProvider, MysqlReader};
