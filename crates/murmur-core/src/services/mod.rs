//! Service layer shared by murmur clients.

mod database;

pub use database::DatabaseService;
