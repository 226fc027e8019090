//! Preferences configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Default debounce window for preference writes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Visibility scope of stored preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Shared by everyone using the table.
    #[default]
    Global,
    /// Per organization.
    Org,
    /// Per user.
    User,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Org => "org",
            Scope::User => "user",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a scope name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Scope::Global),
            "org" | "organization" => Ok(Scope::Org),
            "user" => Ok(Scope::User),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// Where and how a table's preferences are stored.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use datatable_lib::preferences::{PreferencesConfig, Scope};
///
/// let config = PreferencesConfig::new("users-table")
///     .with_scope(Scope::User)
///     .with_user_key("u-42")
///     .with_debounce(Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesConfig {
    /// Table identifier, part of every storage key.
    pub id: String,

    /// Requested scope. Degrades to a broader scope when its key is missing.
    pub scope: Scope,

    /// Caller-supplied user identity for [`Scope::User`].
    pub user_key: Option<String>,

    /// Caller-supplied organization identity for [`Scope::Org`].
    pub org_key: Option<String>,

    /// Schema version written with every payload.
    ///
    /// Default: 1
    pub version: u32,

    /// Write coalescing window.
    ///
    /// Default: 300 ms
    pub debounce: Duration,

    /// Persist the page index too, not only the page size.
    ///
    /// Default: false
    pub persist_page_index: bool,
}

impl PreferencesConfig {
    /// Creates a global-scope config for the table `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: Scope::Global,
            user_key: None,
            org_key: None,
            version: 1,
            debounce: DEFAULT_DEBOUNCE,
            persist_page_index: false,
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_user_key(mut self, key: impl Into<String>) -> Self {
        self.user_key = Some(key.into());
        self
    }

    pub fn with_org_key(mut self, key: impl Into<String>) -> Self {
        self.org_key = Some(key.into());
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_persist_page_index(mut self, persist: bool) -> Self {
        self.persist_page_index = persist;
        self
    }
}
