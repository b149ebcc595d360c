//! Resolution module: the cross-language linker (§4.8).

pub mod linker;

pub use linker::{link, LinkReport};
