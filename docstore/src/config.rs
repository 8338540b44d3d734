use serde::Deserialize;

fn default_database() -> String {
    "(default)".into()
}

fn default_credentials_env() -> String {
    "GOOGLE_CREDENTIALS".into()
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StoreConfig {
    Memory {
        #[serde(default)]
        seed_file: Option<String>,
    },
    Firestore {
        project_id: String,
        #[serde(default = "default_database")]
        database: String,
        // Points at an emulator or proxy instead of the public endpoint
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        credentials: CredentialsConfig,
    },
}

/// Where Firestore access tokens come from.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum CredentialsConfig {
    /// Service account key JSON, base64-encoded or raw, read from an environment variable.
    ServiceAccount {
        #[serde(default = "default_credentials_env")]
        env: String,
    },
    /// Application default credentials of the host (metadata server, gcloud login).
    ApplicationDefault,
    /// No authentication. Only the emulator accepts this.
    None,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        CredentialsConfig::ServiceAccount {
            env: default_credentials_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_firestore() {
        let yaml = r#"
type: firestore
project_id: badge-demo
"#;
        let config: StoreConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config,
            StoreConfig::Firestore {
                project_id: "badge-demo".into(),
                database: "(default)".into(),
                base_url: None,
                credentials: CredentialsConfig::ServiceAccount {
                    env: "GOOGLE_CREDENTIALS".into()
                },
            }
        );
    }

    #[test]
    fn test_parse_credentials() {
        let emulator = r#"
type: firestore
project_id: demo
base_url: http://localhost:8080
credentials:
  type: none
"#;
        let config: StoreConfig = serde_yaml::from_str(emulator).unwrap();
        assert!(matches!(
            config,
            StoreConfig::Firestore {
                credentials: CredentialsConfig::None,
                ..
            }
        ));

        let custom_env: CredentialsConfig =
            serde_yaml::from_str("type: service_account\nenv: FIRESTORE_KEY").unwrap();
        assert_eq!(
            custom_env,
            CredentialsConfig::ServiceAccount {
                env: "FIRESTORE_KEY".into()
            }
        );

        let adc: CredentialsConfig = serde_yaml::from_str("type: application_default").unwrap();
        assert_eq!(adc, CredentialsConfig::ApplicationDefault);

        assert!(serde_yaml::from_str::<CredentialsConfig>("type: api_key").is_err());
    }

    #[test]
    fn test_parse_memory() {
        let config: StoreConfig = serde_yaml::from_str("type: memory").unwrap();
        assert_eq!(config, StoreConfig::Memory { seed_file: None });

        assert!(serde_yaml::from_str::<StoreConfig>("type: postgres").is_err());
    }
}
