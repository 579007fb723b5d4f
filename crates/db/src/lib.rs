pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_from, connect_with_settings, DbPool};
