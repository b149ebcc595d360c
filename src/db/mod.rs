//! SQLite-backed implementation of the property-graph store (§6.1).

pub mod converters;
pub mod schema;
