//! Firebase App
//!
//! The App is the central configuration object. It holds the project
//! credentials, the service endpoints and the HTTP client that the Auth,
//! Firestore and Storage clients share.
//!
//! There is no global registry: build one `App` at startup and pass it (or
//! the [`Backend`](crate::Backend) detected from it) to whatever needs it.

use crate::error::FirebaseError;
use std::sync::Arc;
use std::time::Duration;

/// Name used when `AppOptions::app_name` is not set
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Default Firestore database id
pub const DEFAULT_DATABASE_ID: &str = "(default)";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Firebase App configuration options
#[derive(Clone, Debug)]
pub struct AppOptions {
    /// Firebase API key
    pub api_key: String,
    /// Google Cloud project ID (required for Firestore)
    pub project_id: String,
    /// Cloud Storage bucket, e.g. `my-project.appspot.com` (required for Storage)
    pub storage_bucket: Option<String>,
    /// Firestore database ID (defaults to `(default)`)
    pub database_id: Option<String>,
    /// App name (optional, defaults to "[DEFAULT]")
    pub app_name: Option<String>,
    /// `host:port` of a local Auth emulator
    pub auth_emulator_host: Option<String>,
    /// `host:port` of a local Firestore emulator
    pub firestore_emulator_host: Option<String>,
    /// `host:port` of a local Storage emulator
    pub storage_emulator_host: Option<String>,
    /// Per-request timeout for the shared HTTP client
    pub request_timeout: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            storage_bucket: None,
            database_id: None,
            app_name: None,
            auth_emulator_host: None,
            firestore_emulator_host: None,
            storage_emulator_host: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl AppOptions {
    /// Read options from the environment
    ///
    /// | Variable                         | Field                     |
    /// |----------------------------------|---------------------------|
    /// | `FIREBASE_API_KEY`               | `api_key`                 |
    /// | `FIREBASE_PROJECT_ID`            | `project_id`              |
    /// | `FIREBASE_STORAGE_BUCKET`        | `storage_bucket`          |
    /// | `FIREBASE_DATABASE_ID`           | `database_id`             |
    /// | `FIREBASE_AUTH_EMULATOR_HOST`    | `auth_emulator_host`      |
    /// | `FIRESTORE_EMULATOR_HOST`        | `firestore_emulator_host` |
    /// | `FIREBASE_STORAGE_EMULATOR_HOST` | `storage_emulator_host`   |
    ///
    /// Missing variables leave the field at its default; validation happens
    /// in [`App::new`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            api_key: non_empty("FIREBASE_API_KEY").unwrap_or_default(),
            project_id: non_empty("FIREBASE_PROJECT_ID").unwrap_or_default(),
            storage_bucket: non_empty("FIREBASE_STORAGE_BUCKET"),
            database_id: non_empty("FIREBASE_DATABASE_ID"),
            app_name: None,
            auth_emulator_host: non_empty("FIREBASE_AUTH_EMULATOR_HOST"),
            firestore_emulator_host: non_empty("FIRESTORE_EMULATOR_HOST"),
            storage_emulator_host: non_empty("FIREBASE_STORAGE_EMULATOR_HOST"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Identity Toolkit base URL
    pub fn auth_endpoint(&self) -> String {
        match &self.auth_emulator_host {
            Some(host) => format!("http://{}/identitytoolkit.googleapis.com", host),
            None => "https://identitytoolkit.googleapis.com".to_string(),
        }
    }

    /// Secure Token (refresh) base URL
    pub fn secure_token_endpoint(&self) -> String {
        match &self.auth_emulator_host {
            Some(host) => format!("http://{}/securetoken.googleapis.com", host),
            None => "https://securetoken.googleapis.com".to_string(),
        }
    }

    /// Firestore REST base URL
    pub fn firestore_endpoint(&self) -> String {
        match &self.firestore_emulator_host {
            Some(host) => format!("http://{}", host),
            None => "https://firestore.googleapis.com".to_string(),
        }
    }

    /// Firebase Storage REST base URL
    pub fn storage_endpoint(&self) -> String {
        match &self.storage_emulator_host {
            Some(host) => format!("http://{}", host),
            None => "https://firebasestorage.googleapis.com".to_string(),
        }
    }

    /// Firestore database id, falling back to `(default)`
    pub fn database_id(&self) -> &str {
        self.database_id.as_deref().unwrap_or(DEFAULT_DATABASE_ID)
    }
}

/// Firebase App instance
///
/// Cheap to clone; clones share the same configuration and HTTP client.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    name: String,
    options: AppOptions,
    http_client: reqwest::Client,
}

impl App {
    /// Create a new Firebase App with the given options
    ///
    /// # Example
    /// ```no_run
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// use firebase_stores::{App, AppOptions};
    ///
    /// let options = AppOptions {
    ///     api_key: "YOUR_API_KEY".to_string(),
    ///     project_id: "your-project-id".to_string(),
    ///     ..AppOptions::default()
    /// };
    /// let app = App::new(options)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(options: AppOptions) -> Result<Self, FirebaseError> {
        // Validate options (error case first)
        if options.api_key.is_empty() {
            return Err(FirebaseError::ApiKeyNotConfigured);
        }
        if options.api_key.chars().any(char::is_whitespace) {
            return Err(FirebaseError::InvalidApiKey(
                "API key must not contain whitespace".to_string(),
            ));
        }

        let name = match options.app_name.clone() {
            None => DEFAULT_APP_NAME.to_string(),
            Some(n) => n,
        };

        let http_client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| FirebaseError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(app = %name, project_id = %options.project_id, "created app");

        Ok(App {
            inner: Arc::new(AppInner {
                name,
                options,
                http_client,
            }),
        })
    }

    /// Create an App from [`AppOptions::from_env`]
    pub fn from_env() -> Result<Self, FirebaseError> {
        Self::new(AppOptions::from_env())
    }

    /// Get the app name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the app options
    pub fn options(&self) -> &AppOptions {
        &self.inner.options
    }

    /// Shared HTTP client
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.inner.http_client
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.inner.name)
            .field("project_id", &self.inner.options.project_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
