use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::domain::events::LabEvent;
use crate::services::{
    AuthService, BookingService, CleanupService, ComputerService, DashboardService,
    IssueService, LogService, MaintenanceService, NoticeService, NotificationService,
    ReminderService, SeaOrmAuthService, SeaOrmBookingService, SeaOrmIssueService,
    SeaOrmSessionService, SessionService, SoftwareService, TransferService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub event_bus: broadcast::Sender<LabEvent>,

    pub log_service: Arc<LogService>,

    pub auth_service: Arc<dyn AuthService>,

    pub booking_service: Arc<dyn BookingService>,

    pub session_service: Arc<dyn SessionService>,

    pub issue_service: Arc<dyn IssueService>,

    pub computers: Arc<ComputerService>,

    pub software: Arc<SoftwareService>,

    pub maintenance: Arc<MaintenanceService>,

    pub notices: Arc<NoticeService>,

    pub notifications: Arc<NotificationService>,

    pub users: Arc<UserService>,

    pub reminders: Arc<ReminderService>,

    pub dashboard: Arc<DashboardService>,

    pub transfer: Arc<TransferService>,

    pub cleanup: Arc<CleanupService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);
        Self::with_event_bus(config, event_bus).await
    }

    pub async fn with_event_bus(
        config: Config,
        event_bus: broadcast::Sender<LabEvent>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config = Arc::new(RwLock::new(config));

        let log_service = Arc::new(LogService::new(store.clone(), event_bus.clone()));
        log_service.clone().start_listener();

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.clone(),
            event_bus.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let booking_service = Arc::new(SeaOrmBookingService::new(
            store.clone(),
            config.clone(),
            event_bus.clone(),
        )) as Arc<dyn BookingService + Send + Sync + 'static>;

        let session_service = Arc::new(SeaOrmSessionService::new(
            store.clone(),
            event_bus.clone(),
        )) as Arc<dyn SessionService + Send + Sync + 'static>;

        let issue_service = Arc::new(SeaOrmIssueService::new(store.clone(), event_bus.clone()))
            as Arc<dyn IssueService + Send + Sync + 'static>;

        Ok(Self {
            computers: Arc::new(ComputerService::new(store.clone())),
            software: Arc::new(SoftwareService::new(store.clone())),
            maintenance: Arc::new(MaintenanceService::new(store.clone(), event_bus.clone())),
            notices: Arc::new(NoticeService::new(store.clone())),
            notifications: Arc::new(NotificationService::new(store.clone(), event_bus.clone())),
            users: Arc::new(UserService::new(store.clone())),
            reminders: Arc::new(ReminderService::new(store.clone(), config.clone())),
            dashboard: Arc::new(DashboardService::new(store.clone())),
            transfer: Arc::new(TransferService::new(store.clone())),
            cleanup: Arc::new(CleanupService::new(
                store.clone(),
                config.clone(),
                event_bus.clone(),
            )),
            config,
            store,
            event_bus,
            log_service,
            auth_service,
            booking_service,
            session_service,
            issue_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
