use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "session_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub computer_id: String,
    pub user_id: String,
    pub login_time: String,
    /// Null while the session is running.
    pub logout_time: Option<String>,
    /// Written together with `logout_time`, never on its own.
    pub duration_minutes: Option<i32>,
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
