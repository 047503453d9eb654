//! Snapshot entity - last-fetched copies of lists kept for a fast first paint.
//!
//! Each row holds one JSON document under a unique key (`user`, `classes`, `teachers`).
//! Rows are overwritten on every successful fetch and removed on logout.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "snapshots")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Snapshot key
    #[sea_orm(unique)]
    pub key: String,
    /// Serialized JSON payload
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    /// When the snapshot was last overwritten
    pub updated_at: DateTime,
}

/// `Snapshot` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
