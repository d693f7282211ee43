use std::{env, time::Duration};

pub const DEFAULT_RATE_LIMIT_MAX: usize = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Settings the request handlers and middleware read at request time.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Shared secret for writes. Without one every write is refused.
    pub api_key: Option<String>,
    /// Exposes fault details in 500 responses.
    pub development: bool,
    pub rate_limit_max: usize,
    pub rate_limit_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            development: false,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window: DEFAULT_RATE_LIMIT_WINDOW,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("API_KEY environment variable is not set. Every write request will be refused.");
        }

        let development = env::var("APP_ENV")
            .map(|app_env| app_env.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        let rate_limit_max = parse_env("RATE_LIMIT_MAX").unwrap_or(DEFAULT_RATE_LIMIT_MAX);
        let rate_limit_window = parse_env("RATE_LIMIT_WINDOW_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW);

        Self {
            api_key,
            development,
            rate_limit_max,
            rate_limit_window,
        }
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring unparsable {}={:?}", name, value);
            None
        }
    }
}
