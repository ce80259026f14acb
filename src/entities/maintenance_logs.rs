use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "maintenance_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub computer_id: String,
    pub performed_by: String,
    pub maintenance_type: String,
    pub description: String,
    pub parts_replaced: Option<String>,
    pub cost: Option<f64>,
    pub started_at: String,
    /// Null while the work is in progress.
    pub completed_at: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
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
