use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::Role;

pub mod migrator;
pub mod repositories;

pub use crate::entities::system_logs::Model as SystemLog;
pub use repositories::logs::LogFilter;
pub use repositories::user::{DeletedRows, NewAccount, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn profiles(&self) -> repositories::profile::ProfileRepository {
        repositories::profile::ProfileRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn computers(&self) -> repositories::computer::ComputerRepository {
        repositories::computer::ComputerRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn bookings(&self) -> repositories::booking::BookingRepository {
        repositories::booking::BookingRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn issues(&self) -> repositories::issue::IssueRepository {
        repositories::issue::IssueRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn sessions(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn software(&self) -> repositories::software::SoftwareRepository {
        repositories::software::SoftwareRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn maintenance(&self) -> repositories::maintenance::MaintenanceRepository {
        repositories::maintenance::MaintenanceRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn notices(&self) -> repositories::notice::NoticeRepository {
        repositories::notice::NoticeRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn notifications(&self) -> repositories::notification::NotificationRepository {
        repositories::notification::NotificationRepository::new(self.conn.clone())
    }

    fn logs_repo(&self) -> repositories::logs::LogRepository {
        repositories::logs::LogRepository::new(self.conn.clone())
    }

    /// Role predicate over `user_roles`.
    pub async fn has_role(&self, user_id: &str, role: Role) -> Result<bool> {
        self.users().has_role(user_id, role).await
    }

    pub async fn is_admin_or_staff(&self, user_id: &str) -> Result<bool> {
        self.users().is_admin_or_staff(user_id).await
    }

    pub async fn add_log(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        details: Option<String>,
    ) -> Result<()> {
        self.logs_repo()
            .add(event_type, level, message, details)
            .await
    }

    pub async fn get_logs(
        &self,
        page: u64,
        page_size: u64,
        filter: LogFilter,
    ) -> Result<(Vec<SystemLog>, u64)> {
        self.logs_repo().get_logs(page, page_size, filter).await
    }

    pub async fn clear_logs(&self) -> Result<u64> {
        self.logs_repo().clear_logs().await
    }

    pub async fn prune_logs(&self, days: i64) -> Result<u64> {
        self.logs_repo().prune_logs(days).await
    }
}
