pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod profiles;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use profiles::{ProfileRepository, PROFILES_COLLECTION};
pub use store::{Store, StoreError, StoreResult, ID_COLUMN};
