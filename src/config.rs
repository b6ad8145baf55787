use log::info;

/// Environment variable toggling remote mode
pub const ENV_API_ENABLED: &str = "POCKETBUDGET_API_ENABLED";

/// Environment variable holding the API base URL
pub const ENV_API_URL: &str = "POCKETBUDGET_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Runtime configuration for the core: whether the remote backend may be
/// used at all, and where it lives.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_enabled: bool,
    pub api_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_enabled: false,
            api_base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn new(api_enabled: bool, api_base_url: impl Into<String>) -> Self {
        AppConfig {
            api_enabled,
            api_base_url: api_base_url.into(),
        }
    }

    pub fn from_env() -> Self {
        let api_enabled = std::env::var(ENV_API_ENABLED)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let api_base_url = std::env::var(ENV_API_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        info!(
            "Loaded configuration: api_enabled={}, api_base_url={}",
            api_enabled, api_base_url
        );

        AppConfig {
            api_enabled,
            api_base_url,
        }
    }
}
