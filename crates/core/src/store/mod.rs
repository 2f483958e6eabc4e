//! Persistence for wanted media, profiles, known releases and size overrides.

mod sqlite_store;
mod store;

pub use sqlite_store::SqliteMediaStore;
pub use store::{MediaStore, StoreError};
