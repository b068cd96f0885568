pub mod dir;
pub mod kind;
pub mod manager;

pub use dir::*;
pub use kind::*;
pub use manager::*;

/// The template every kind renders from
pub const ENTRY_TEMPLATE: &str = "client.rs.tera";
