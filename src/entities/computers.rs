use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::domain::ComputerStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "computers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Asset tag printed on the machine, e.g. `LAB-PC-014`.
    #[sea_orm(unique)]
    pub system_id: String,
    pub name: String,
    pub location: Option<String>,
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub os_version: Option<String>,
    pub purchase_date: Option<String>,
    pub warranty_expiry: Option<String>,
    pub notes: Option<String>,
    pub status: ComputerStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::session_logs::Entity")]
    SessionLogs,
    #[sea_orm(has_many = "super::issues::Entity")]
    Issues,
    #[sea_orm(has_many = "super::computer_software::Entity")]
    ComputerSoftware,
    #[sea_orm(has_many = "super::maintenance_logs::Entity")]
    MaintenanceLogs,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::session_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionLogs.def()
    }
}

impl Related<super::issues::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issues.def()
    }
}

impl Related<super::maintenance_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceLogs.def()
    }
}

impl Related<super::software::Entity> for Entity {
    fn to() -> RelationDef {
        super::computer_software::Relation::Software.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::computer_software::Relation::Computers.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
