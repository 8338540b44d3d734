use docstore::config::StoreConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty collection name for {0}")]
    EmptyCollectionName(&'static str),

    #[error("Empty API key header name")]
    EmptyHeaderName,

    #[error("Empty API key environment variable name")]
    EmptyApiKeyEnv,
}

/// Tracker configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the tracking endpoints
    #[serde(default = "Listener::default_main")]
    pub listener: Listener,
    /// Listener for health and readiness probes
    #[serde(default = "Listener::default_admin")]
    pub admin_listener: Listener,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub collections: Collections,
    pub store: StoreConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;
        self.auth.validate()?;
        self.collections.validate()?;
        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    fn default_main() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }

    fn default_admin() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3001,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Where the service-wide shared secret comes from and which header carries it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub header_name: String,
    /// Environment variable read once at startup
    pub global_api_key_env: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            header_name: "x-api-key".into(),
            global_api_key_env: "API_KEY".into(),
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.header_name.is_empty() {
            return Err(ValidationError::EmptyHeaderName);
        }
        if self.global_api_key_env.is_empty() {
            return Err(ValidationError::EmptyApiKeyEnv);
        }
        Ok(())
    }
}

/// Names of the document collections holding each entity.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Collections {
    pub members: String,
    pub readers: String,
    pub institution_keys: String,
}

impl Default for Collections {
    fn default() -> Self {
        Collections {
            members: "institution_members".into(),
            readers: "reader_locations".into(),
            institution_keys: "institution_keys".into(),
        }
    }
}

impl Collections {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("members", &self.members),
            ("readers", &self.readers),
            ("institution_keys", &self.institution_keys),
        ] {
            if value.is_empty() {
                return Err(ValidationError::EmptyCollectionName(name));
            }
        }
        Ok(())
    }
}
