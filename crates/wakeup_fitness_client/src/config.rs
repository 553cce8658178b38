use crate::{DEFAULT_WINDOW, HealthDataError};
use secrecy::SecretString;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/fitness/v1";
pub const DEFAULT_USER_ID: &str = "me";
pub const DEFAULT_SLEEP_SOURCE: &str =
    "derived:com.google.sleep.segment:com.google.android.gms:merged";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct Config {
    /// OAuth bearer token. `None` means there is no session.
    pub access_token: Option<SecretString>,
    pub base_url: String,
    pub user_id: String,
    pub sleep_source_id: String,
    pub timeout: Duration,
    pub window_days: NonZeroU32,
}

impl Config {
    pub fn from_env() -> Result<Self, HealthDataError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, HealthDataError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let access_token = get("GOOGLE_FIT_ACCESS_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::new(t.into()));
        let base_url = get("GOOGLE_FIT_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let user_id = get("GOOGLE_FIT_USER_ID").unwrap_or_else(|| DEFAULT_USER_ID.into());
        let sleep_source_id =
            get("GOOGLE_FIT_SLEEP_SOURCE").unwrap_or_else(|| DEFAULT_SLEEP_SOURCE.into());

        let timeout_secs = match get("WAKEUP_FITNESS_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                HealthDataError::Config(format!("WAKEUP_FITNESS_TIMEOUT_SECS invalid: {raw}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let window_days = match get("WAKEUP_FITNESS_WINDOW_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(NonZeroU32::new)
                .ok_or_else(|| {
                    HealthDataError::Config(format!(
                        "WAKEUP_FITNESS_WINDOW_DAYS must be a positive integer: {raw}"
                    ))
                })?,
            None => DEFAULT_WINDOW,
        };

        Ok(Self {
            access_token,
            base_url,
            user_id,
            sleep_source_id,
            timeout: Duration::from_secs(timeout_secs),
            window_days,
        })
    }
}
