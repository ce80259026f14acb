use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::domain::{IssuePriority, IssueStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub computer_id: String,
    pub reported_by: String,
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<String>,
    pub resolved_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::computers::Entity",
        from = "Column::ComputerId",
        to = "super::computers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Computers,
}

impl Related<super::computers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Computers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
