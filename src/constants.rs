/// Storage key for the transactions collection
pub const STORAGE_KEY_TRANSACTIONS: &str = "pocketbudget.transactions";

/// Storage key for the categories collection
pub const STORAGE_KEY_CATEGORIES: &str = "pocketbudget.categories";

/// Storage key for the budgets collection
pub const STORAGE_KEY_BUDGETS: &str = "pocketbudget.budgets";

/// Storage key for the users collection
pub const STORAGE_KEY_USERS: &str = "pocketbudget.users";

/// Storage key for the offline operation queue
pub const STORAGE_KEY_OFFLINE_QUEUE: &str = "pocketbudget.offline_queue";

/// Storage key for app metadata (schema version)
pub const STORAGE_KEY_APP_META: &str = "pocketbudget.meta";

/// Current storage schema version
pub const STORAGE_SCHEMA_VERSION: u32 = 1;

/// Upper bound on parent-chain hops during cycle detection
pub const MAX_HIERARCHY_WALK: usize = 32;

/// Default budget alert threshold (percent)
pub const DEFAULT_ALERT_THRESHOLD: u8 = 80;

/// Prefix for client-temporary ids assigned to records created offline
pub const TEMP_ID_PREFIX: &str = "temp";
