use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::domain::BookingStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub computer_id: String,
    pub user_id: String,
    pub start_time: String,
    pub end_time: String,
    pub purpose: Option<String>,
    pub status: BookingStatus,
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
