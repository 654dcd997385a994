use std::{path::PathBuf, sync::Arc, time::Duration};

use url::Url;

use crate::{
    credential::{CookieJar, CredentialAccessor, EmbeddedToken, FileStore, MemoryStore},
    error::ConfigError,
    poller::DEFAULT_POLL_INTERVAL,
};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

pub const ENV_API_URL: &str = "LEDGER_API_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "LEDGER_POLL_INTERVAL_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "LEDGER_REQUEST_TIMEOUT_MS";
pub const ENV_CSRF_TOKEN: &str = "LEDGER_CSRF_TOKEN";
pub const ENV_JWT_TOKEN: &str = "LEDGER_JWT_TOKEN";
pub const ENV_TOKEN_FILE: &str = "LEDGER_TOKEN_FILE";
pub const ENV_COOKIE_FILE: &str = "LEDGER_COOKIE_FILE";
pub const ENV_ANALYTICS_FILE: &str = "LEDGER_ANALYTICS_FILE";
pub const ENV_LOG_FILE: &str = "LEDGER_LOG_FILE";

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Base url of the server API
    pub api_url: String,
    /// Delay between poll cycles
    pub poll_interval: Duration,
    /// Per-request timeout, none by default
    pub request_timeout: Option<Duration>,
    /// Anti-forgery token sent with admin actions
    pub csrf_token: Option<String>,
    /// Bearer token supplied up front, checked before any store
    pub jwt_token: Option<String>,
    /// Persistent token store
    pub token_file: Option<PathBuf>,
    /// Netscape cookie file holding a `jwt_token` cookie
    pub cookie_file: Option<PathBuf>,
    /// Analytics payload
    pub analytics_file: Option<PathBuf>,
    /// Log destination for the terminal dashboard
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
            csrf_token: None,
            jwt_token: None,
            token_file: None,
            cookie_file: None,
            analytics_file: None,
            log_file: None,
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration with custom API url
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_jwt_token(mut self, token: impl Into<String>) -> Self {
        self.jwt_token = Some(token.into());
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn with_cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = Some(path.into());
        self
    }

    pub fn with_analytics_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.analytics_file = Some(path.into());
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from `lookup`, falling back to defaults for unset or empty vars.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let api_url = var(ENV_API_URL).unwrap_or(defaults.api_url);
        parse_api_url(ENV_API_URL, &api_url)?;

        let poll_interval = match var(ENV_POLL_INTERVAL_MS) {
            Some(value) => parse_millis(ENV_POLL_INTERVAL_MS, &value)?
                .ok_or(ConfigError::InvalidDuration {
                    var: ENV_POLL_INTERVAL_MS,
                    value,
                })?,
            None => defaults.poll_interval,
        };

        let request_timeout = match var(ENV_REQUEST_TIMEOUT_MS) {
            Some(value) => parse_millis(ENV_REQUEST_TIMEOUT_MS, &value)?,
            None => None,
        };

        Ok(Self {
            api_url,
            poll_interval,
            request_timeout,
            csrf_token: var(ENV_CSRF_TOKEN),
            jwt_token: var(ENV_JWT_TOKEN),
            token_file: var(ENV_TOKEN_FILE).map(PathBuf::from),
            cookie_file: var(ENV_COOKIE_FILE).map(PathBuf::from),
            analytics_file: var(ENV_ANALYTICS_FILE).map(PathBuf::from),
            log_file: var(ENV_LOG_FILE).map(PathBuf::from),
        })
    }

    /// Parsed [`DashboardConfig::api_url`].
    pub fn api_base(&self) -> Result<Url, ConfigError> {
        parse_api_url(ENV_API_URL, &self.api_url)
    }

    /// Token stores in priority order: embedded value, token file, `session`, cookie jar.
    pub fn credential_accessor(&self, session: Arc<MemoryStore>) -> CredentialAccessor {
        let mut accessor =
            CredentialAccessor::default().with_store(EmbeddedToken(self.jwt_token.clone()));
        if let Some(path) = &self.token_file {
            accessor = accessor.with_store(FileStore::new(path));
        }
        accessor = accessor.with_store(session);
        if let Some(path) = &self.cookie_file {
            accessor = accessor.with_store(CookieJar::File(path.clone()));
        }
        accessor
    }
}

fn parse_api_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|error| ConfigError::InvalidUrl {
        var,
        reason: error.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme {scheme}"),
        }),
    }
}

/// Parse whole milliseconds, where `0` means "none".
fn parse_millis(var: &'static str, value: &str) -> Result<Option<Duration>, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(|millis| (millis > 0).then(|| Duration::from_millis(millis)))
        .map_err(|_| ConfigError::InvalidDuration {
            var,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        struct TestCase {
            input: Vec<(&'static str, &'static str)>,
            expected: Result<DashboardConfig, ConfigError>,
        }

        let tests = vec![
            TestCase {
                // TC0: nothing set yields defaults
                input: vec![],
                expected: Ok(DashboardConfig::default()),
            },
            TestCase {
                // TC1: every variable set
                input: vec![
                    (ENV_API_URL, "https://bank.example"),
                    (ENV_POLL_INTERVAL_MS, "5000"),
                    (ENV_REQUEST_TIMEOUT_MS, "2500"),
                    (ENV_CSRF_TOKEN, "csrf"),
                    (ENV_JWT_TOKEN, "jwt-token-value"),
                    (ENV_TOKEN_FILE, "/tmp/token.json"),
                    (ENV_COOKIE_FILE, "/tmp/cookies.txt"),
                    (ENV_ANALYTICS_FILE, "/tmp/analytics.json"),
                    (ENV_LOG_FILE, "/tmp/dashboard.log"),
                ],
                expected: Ok(DashboardConfig::new("https://bank.example")
                    .with_poll_interval(Duration::from_millis(5000))
                    .with_request_timeout(Some(Duration::from_millis(2500)))
                    .with_csrf_token("csrf")
                    .with_jwt_token("jwt-token-value")
                    .with_token_file("/tmp/token.json")
                    .with_cookie_file("/tmp/cookies.txt")
                    .with_analytics_file("/tmp/analytics.json")
                    .with_log_file("/tmp/dashboard.log")),
            },
            TestCase {
                // TC2: empty values are treated as unset
                input: vec![(ENV_API_URL, ""), (ENV_CSRF_TOKEN, "  ")],
                expected: Ok(DashboardConfig::default()),
            },
            TestCase {
                // TC3: zero timeout disables it
                input: vec![(ENV_REQUEST_TIMEOUT_MS, "0")],
                expected: Ok(DashboardConfig::default()),
            },
            TestCase {
                // TC4: zero poll interval is rejected
                input: vec![(ENV_POLL_INTERVAL_MS, "0")],
                expected: Err(ConfigError::InvalidDuration {
                    var: ENV_POLL_INTERVAL_MS,
                    value: "0".to_string(),
                }),
            },
            TestCase {
                // TC5: non numeric interval
                input: vec![(ENV_POLL_INTERVAL_MS, "30s")],
                expected: Err(ConfigError::InvalidDuration {
                    var: ENV_POLL_INTERVAL_MS,
                    value: "30s".to_string(),
                }),
            },
            TestCase {
                // TC6: unsupported scheme
                input: vec![(ENV_API_URL, "ftp://bank.example")],
                expected: Err(ConfigError::InvalidUrl {
                    var: ENV_API_URL,
                    reason: "unsupported scheme ftp".to_string(),
                }),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = DashboardConfig::from_lookup(lookup(&test.input));
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_unparseable_url() {
        let actual = DashboardConfig::from_lookup(lookup(&[(ENV_API_URL, "not a url")]));
        assert!(matches!(
            actual,
            Err(ConfigError::InvalidUrl { var: ENV_API_URL, .. })
        ));
    }

    #[test]
    fn test_credential_accessor_order() {
        let session = Arc::new(MemoryStore::new());
        session.insert(crate::credential::TOKEN_KEY, "session-token-123");

        let config = DashboardConfig::default().with_cookie_file("/definitely/not/here");
        let (store, _) = config
            .credential_accessor(Arc::clone(&session))
            .resolve()
            .unwrap();
        assert_eq!(store, "session");

        let config = config.with_jwt_token("embedded-token-123");
        let (store, token) = config.credential_accessor(session).resolve().unwrap();
        assert_eq!(store, "embedded");
        assert_eq!(token.as_str(), "embedded-token-123");
    }
}
