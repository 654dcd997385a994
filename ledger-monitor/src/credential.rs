//! Authentication token lookup across several client-side stores.
//!
//! Stores are consulted in a fixed priority order and the first token long enough to be a
//! real credential wins. A store that cannot be read is skipped, never fatal.

use std::{
    collections::HashMap,
    fmt::Debug,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::CredentialError;

/// Key under which every store keeps the bearer token.
pub const TOKEN_KEY: &str = "jwt_token";

/// Tokens of this length or shorter are treated as placeholders.
pub const MIN_TOKEN_LEN: usize = 10;

/// Opaque bearer token, guaranteed longer than [`MIN_TOKEN_LEN`].
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken(String);

impl CredentialToken {
    /// Accept `raw` if it qualifies as a token.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        (raw.len() > MIN_TOKEN_LEN).then_some(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for CredentialToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CredentialToken(<{} chars>)", self.0.len())
    }
}

/// A single place a token may be stored.
pub trait TokenStore: Send + Sync {
    /// Short store name used in logs.
    fn name(&self) -> &'static str;

    /// Read the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, CredentialError>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn read(&self, key: &str) -> Result<Option<String>, CredentialError> {
        (**self).read(key)
    }
}

/// Value supplied up front by configuration.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedToken(pub Option<String>);

impl TokenStore for EmbeddedToken {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn read(&self, _: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.0.clone())
    }
}

/// Persistent store backed by a file on disk.
///
/// The file holds either a JSON object of `key: value` pairs or a single bare token.
/// A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn read(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CredentialError::Io {
                    store: self.name(),
                    source,
                });
            }
        };

        let trimmed = contents.trim();
        if !trimmed.starts_with('{') {
            return Ok((!trimmed.is_empty()).then(|| trimmed.to_string()));
        }

        let entries = serde_json::from_str::<HashMap<String, serde_json::Value>>(trimmed)
            .map_err(|error| CredentialError::Corrupt {
                store: self.name(),
                reason: error.to_string(),
            })?;

        Ok(entries
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }
}

/// Session-scoped store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }
}

impl TokenStore for MemoryStore {
    fn name(&self) -> &'static str {
        "session"
    }

    fn read(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.entries.read().get(key).cloned())
    }
}

/// Cookie store, read from a Netscape cookie file or a `Cookie:` header line.
#[derive(Debug, Clone)]
pub enum CookieJar {
    File(PathBuf),
    Header(String),
}

impl CookieJar {
    /// Find cookie `name` in either supported text format.
    pub fn find_cookie(text: &str, name: &str) -> Option<String> {
        text.lines().find_map(|line| {
            let line = line.trim();
            // Netscape files prefix http-only cookies with a comment marker
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.is_empty() || line.starts_with('#') {
                return None;
            }

            let columns = line.split('\t').collect::<Vec<_>>();
            if columns.len() == 7 {
                return (columns[5] == name).then(|| columns[6].to_string());
            }

            let line = line.strip_prefix("Cookie:").unwrap_or(line);
            line.split(';').find_map(|pair| {
                let (cookie, value) = pair.trim().split_once('=')?;
                (cookie == name).then(|| value.to_string())
            })
        })
    }
}

impl TokenStore for CookieJar {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn read(&self, key: &str) -> Result<Option<String>, CredentialError> {
        match self {
            CookieJar::Header(header) => Ok(Self::find_cookie(header, key)),
            CookieJar::File(path) => match std::fs::read_to_string(path) {
                Ok(contents) => Ok(Self::find_cookie(&contents, key)),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(CredentialError::Io {
                    store: self.name(),
                    source,
                }),
            },
        }
    }
}

/// Ordered set of [`TokenStore`]s searched for the bearer token.
#[derive(Default)]
pub struct CredentialAccessor {
    stores: Vec<Box<dyn TokenStore>>,
}

impl Debug for CredentialAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stores.iter().map(|store| store.name()))
            .finish()
    }
}

impl CredentialAccessor {
    pub fn new(stores: Vec<Box<dyn TokenStore>>) -> Self {
        Self { stores }
    }

    /// Append a store with lower priority than every existing one.
    pub fn with_store(mut self, store: impl TokenStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }

    /// First qualifying token across all stores.
    pub fn get_token(&self) -> Option<CredentialToken> {
        self.resolve().map(|(_, token)| token)
    }

    /// First qualifying token along with the name of the store that supplied it.
    pub fn resolve(&self) -> Option<(&'static str, CredentialToken)> {
        self.stores.iter().find_map(|store| {
            match store.read(TOKEN_KEY) {
                Ok(Some(value)) => match CredentialToken::new(value) {
                    Some(token) => return Some((store.name(), token)),
                    None => debug!(store = store.name(), "ignoring placeholder token"),
                },
                Ok(None) => {}
                Err(error) => debug!(store = store.name(), %error, "token store unavailable"),
            }
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FailingStore;

    impl TokenStore for FailingStore {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn read(&self, _: &str) -> Result<Option<String>, CredentialError> {
            Err(CredentialError::Io {
                store: "failing",
                source: std::io::Error::new(ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "ledger-monitor-{}-{}",
            std::process::id(),
            name
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_get_token_first_qualifying_wins() {
        struct TestCase {
            input: Vec<Option<&'static str>>,
            expected: Option<&'static str>,
        }

        let tests = vec![
            TestCase {
                // TC0: short and empty candidates are skipped
                input: vec![Some("short"), Some(""), Some("longtoken123")],
                expected: Some("longtoken123"),
            },
            TestCase {
                // TC1: highest priority qualifying token wins
                input: vec![Some("first-token-abc"), Some("second-token-abc")],
                expected: Some("first-token-abc"),
            },
            TestCase {
                // TC2: exactly ten characters does not qualify
                input: vec![Some("0123456789"), None],
                expected: None,
            },
            TestCase {
                // TC3: eleven characters qualifies
                input: vec![None, Some("01234567890")],
                expected: Some("01234567890"),
            },
            TestCase {
                // TC4: nothing stored anywhere
                input: vec![None, None, None, None],
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let stores = test
                .input
                .into_iter()
                .map(|value| Box::new(EmbeddedToken(value.map(str::to_string))) as Box<dyn TokenStore>)
                .collect();

            let actual = CredentialAccessor::new(stores).get_token();
            assert_eq!(
                actual.as_ref().map(CredentialToken::as_str),
                test.expected,
                "TC{} failed",
                index
            );
        }
    }

    #[test]
    fn test_failing_store_is_skipped() {
        let session = MemoryStore::new();
        session.insert(TOKEN_KEY, "session-token-xyz");

        let accessor = CredentialAccessor::default()
            .with_store(FailingStore)
            .with_store(session);

        let (store, token) = accessor.resolve().unwrap();
        assert_eq!(store, "session");
        assert_eq!(token.as_str(), "session-token-xyz");
    }

    #[test]
    fn test_file_store_formats() {
        let json = temp_file("store.json", r#"{"jwt_token": "file-token-abcdef", "other": 1}"#);
        let bare = temp_file("store.txt", "  bare-token-abcdef\n");
        let corrupt = temp_file("corrupt.json", "{not json");

        assert_eq!(
            FileStore::new(&json).read(TOKEN_KEY).unwrap().as_deref(),
            Some("file-token-abcdef")
        );
        assert_eq!(FileStore::new(&json).read("other").unwrap(), None);
        assert_eq!(
            FileStore::new(&bare).read(TOKEN_KEY).unwrap().as_deref(),
            Some("bare-token-abcdef")
        );
        assert!(matches!(
            FileStore::new(&corrupt).read(TOKEN_KEY),
            Err(CredentialError::Corrupt { store: "file", .. })
        ));
        assert_eq!(
            FileStore::new("/definitely/not/here").read(TOKEN_KEY).unwrap(),
            None
        );

        for path in [json, bare, corrupt] {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn test_find_cookie() {
        struct TestCase {
            input: &'static str,
            expected: Option<&'static str>,
        }

        let tests = vec![
            TestCase {
                // TC0: header line
                input: "session=abc; jwt_token=cookie-token-123; theme=dark",
                expected: Some("cookie-token-123"),
            },
            TestCase {
                // TC1: header line with prefix
                input: "Cookie: jwt_token=cookie-token-123",
                expected: Some("cookie-token-123"),
            },
            TestCase {
                // TC2: netscape file
                input: "# Netscape HTTP Cookie File\n\
                        localhost\tFALSE\t/\tFALSE\t0\tcsrftoken\tabc\n\
                        localhost\tFALSE\t/\tFALSE\t0\tjwt_token\tnetscape-token-1\n",
                expected: Some("netscape-token-1"),
            },
            TestCase {
                // TC3: netscape http-only entry
                input: "#HttpOnly_localhost\tFALSE\t/\tTRUE\t0\tjwt_token\thttponly-token-1",
                expected: Some("httponly-token-1"),
            },
            TestCase {
                // TC4: prefix match is not a name match
                input: "jwt_token_old=stale-token-123",
                expected: None,
            },
            TestCase {
                // TC5: empty jar
                input: "",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = CookieJar::find_cookie(test.input, TOKEN_KEY);
            assert_eq!(actual.as_deref(), test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = CredentialToken::new("secret-token-value").unwrap();
        assert_eq!(format!("{token:?}"), "CredentialToken(<18 chars>)");
    }
}
