use std::collections::HashMap;
use std::time::Duration;

/// Environment-driven configuration for the scan backend client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL of the backend API, e.g. `http://127.0.0.1:8000/api`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl ClientSettings {
    const API_URL_ENV: &'static str = "EXPOCHECK_API_URL";
    const TIMEOUT_ENV: &'static str = "EXPOCHECK_TIMEOUT_SECS";

    pub const DEFAULT_API_URL: &'static str = "http://127.0.0.1:8000/api";

    /// Load settings from environment variables.
    ///
    /// * `EXPOCHECK_API_URL`     — Backend base URL (default: local backend).
    /// * `EXPOCHECK_TIMEOUT_SECS` — Per-request timeout in seconds.
    pub fn from_env() -> Self {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Self {
        let base_url = vars
            .get(Self::API_URL_ENV)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_API_URL.to_string())
            .trim()
            .to_string();
        let timeout_secs = vars
            .get(Self::TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            base_url,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(10))
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_API_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn with_env_lock<F: FnOnce()>(func: F) {
        let _guard = ENV_LOCK.lock().unwrap();
        func();
    }

    #[test]
    fn defaults_to_local_backend() {
        with_env_lock(|| {
            env::remove_var(ClientSettings::API_URL_ENV);
            env::remove_var(ClientSettings::TIMEOUT_ENV);

            let settings = ClientSettings::from_env();
            assert_eq!(settings.base_url, ClientSettings::DEFAULT_API_URL);
            assert!(settings.timeout_secs.is_none());
            assert_eq!(settings.timeout(), Duration::from_secs(10));
        });
    }

    #[test]
    fn reads_url_and_timeout_from_env() {
        with_env_lock(|| {
            env::set_var(ClientSettings::API_URL_ENV, "http://scanhost:9000/api");
            env::set_var(ClientSettings::TIMEOUT_ENV, "45");

            let settings = ClientSettings::from_env();
            assert_eq!(settings.base_url, "http://scanhost:9000/api");
            assert_eq!(settings.timeout_secs, Some(45));

            env::remove_var(ClientSettings::API_URL_ENV);
            env::remove_var(ClientSettings::TIMEOUT_ENV);
        });
    }

    #[test]
    fn blank_url_falls_back_to_default() {
        with_env_lock(|| {
            env::set_var(ClientSettings::API_URL_ENV, "   ");
            env::remove_var(ClientSettings::TIMEOUT_ENV);

            let settings = ClientSettings::from_env();
            assert_eq!(settings.base_url, ClientSettings::DEFAULT_API_URL);

            env::remove_var(ClientSettings::API_URL_ENV);
        });
    }
}
