//! Report storage adapters.

mod memory;

pub use memory::InMemoryReportRepository;

#[cfg(feature = "sqlite-store")]
mod sqlite;

#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteStore;
