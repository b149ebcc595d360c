//! Store Gateway module (§4.2).

pub mod gateway;

pub use gateway::{GraphGateway, Row, Statistics};
