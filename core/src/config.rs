//! Client configuration.
//!
//! # Design
//! A plain struct with `Default` and `with_*` builders. Credentials are kept
//! as strings exactly as supplied; deciding between token and email/password
//! happens once in `UptimeClient` construction. `Debug` redacts secrets.

use std::fmt;
use std::time::Duration;

use crate::transport::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://uptime.com/api/v1/";

pub const ENV_API_URL: &str = "UPTIME_API_URL";
pub const ENV_SUBACCOUNT: &str = "UPTIME_SUBACCOUNT";
pub const ENV_TOKEN: &str = "UPTIME_TOKEN";
pub const ENV_EMAIL: &str = "UPTIME_EMAIL";
pub const ENV_PASSWORD: &str = "UPTIME_PASSWORD";

#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub subaccount: Option<String>,
    pub token: String,
    pub email: String,
    pub password: String,
    pub retry: RetryPolicy,
    /// Overall deadline for a single attempt; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            subaccount: None,
            token: String::new(),
            email: String::new(),
            password: String::new(),
            retry: RetryPolicy::default(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientConfig {
    /// Configuration authenticating with an API token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Configuration exchanging email and password for a token.
    pub fn with_login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    /// Reads `UPTIME_*` variables; unset ones keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        config.subaccount = lookup(ENV_SUBACCOUNT).filter(|v| !v.is_empty());
        config.token = lookup(ENV_TOKEN).unwrap_or_default();
        config.email = lookup(ENV_EMAIL).unwrap_or_default();
        config.password = lookup(ENV_PASSWORD).unwrap_or_default();
        config
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn subaccount(mut self, subaccount: impl Into<String>) -> Self {
        let subaccount = subaccount.into();
        self.subaccount = (!subaccount.is_empty()).then_some(subaccount);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("subaccount", &self.subaccount)
            .field("token", &redact(&self.token))
            .field("email", &self.email)
            .field("password", &redact(&self.password))
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "[redacted]"
    }
}
