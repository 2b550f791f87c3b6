//! `SeaORM` entity definitions for `SqliteStore`.

pub mod report;
