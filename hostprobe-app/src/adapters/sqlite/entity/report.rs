//! `SeaORM` entity for the `reports` table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
/// Database row model for a stored report.
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub caller_id: String,
    pub host: String,
    pub port: Option<i32>,
    /// `full_analysis` or `load_test`
    pub kind: String,
    pub concurrency: Option<i32>,
    pub duration_secs: Option<i64>,
    /// JSON document
    pub payload: String,
    pub status: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
