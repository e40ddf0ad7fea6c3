//! SQLite persistence: connection setup, schema, and the repository layer.

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
