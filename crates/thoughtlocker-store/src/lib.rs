pub mod error;
pub mod loader;
pub mod repository;
pub mod schema;
pub mod store;
pub mod transaction;

pub use error::StoreError;
pub use loader::{LoadReport, apply_specs};
pub use store::Locker;
