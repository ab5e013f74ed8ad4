pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{Database, DatabaseError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{EmployeeStore, ProjectStore, StoreError, StoreLifecycle};
