use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// Same value as `users.id`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
