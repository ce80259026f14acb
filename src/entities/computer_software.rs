use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "computer_software")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub computer_id: String,
    pub software_id: String,
    pub installed_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::computers::Entity",
        from = "Column::ComputerId",
        to = "super::computers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Computers,
    #[sea_orm(
        belongs_to = "super::software::Entity",
        from = "Column::SoftwareId",
        to = "super::software::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Software,
}

impl Related<super::computers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Computers.def()
    }
}

impl Related<super::software::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Software.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
