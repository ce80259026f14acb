use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "software")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub vendor: Option<String>,
    pub license_key: Option<String>,
    /// Date (`YYYY-MM-DD`) or timestamp.
    pub license_expiry: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::computer_software::Entity")]
    ComputerSoftware,
}

impl Related<super::computer_software::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComputerSoftware.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
