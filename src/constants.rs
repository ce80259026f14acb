pub const APP_NAME: &str = "labdesk";

/// Seeded by the initial migration. Must be changed on first login.
pub const BOOTSTRAP_ADMIN_EMAIL: &str = "admin@lab.local";

pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "password";

/// API key of the bootstrap admin until regenerated.
pub const DEFAULT_API_KEY: &str = "labdesk_default_api_key_please_regenerate";

pub const SESSION_USER_KEY: &str = "user";

pub mod limits {

    pub const MIN_PASSWORD_LENGTH: usize = 8;

    pub const MAX_TITLE_LENGTH: usize = 200;

    pub const MAX_TEXT_LENGTH: usize = 5000;

    pub const DEFAULT_LOG_PAGE_SIZE: u64 = 50;

    pub const TOP_COMPUTERS_BY_USAGE: usize = 10;

    pub const MAX_IMPORT_ROWS: usize = 10_000;
}

pub mod notification_kinds {

    pub const BOOKING: &str = "booking";

    pub const ISSUE: &str = "issue";

    pub const SYSTEM: &str = "system";
}

/// Accepted `maintenance_type` values.
pub const MAINTENANCE_TYPES: &[&str] = &[
    "Preventive",
    "Corrective",
    "Hardware Upgrade",
    "Software Update",
    "Cleaning",
    "Repair",
    "Inspection",
    "Other",
];
