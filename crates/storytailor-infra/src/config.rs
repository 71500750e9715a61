//! Configuration loading for StoryTailor.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! [`GroundingConfig`]. Falls back to defaults when the file is missing or
//! malformed; range validation happens when the service is built.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use storytailor_types::config::GroundingConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STORYTAILOR_DATA_DIR";

/// Environment variable holding the OpenAI-compatible API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const CONFIG_FILE: &str = "config.toml";

pub const SNAPSHOT_FILE: &str = "knowledge.json";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or unparseable file: a warning, then defaults.
pub async fn load_config(data_dir: &Path) -> GroundingConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GroundingConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GroundingConfig::default();
        }
    };

    match toml::from_str::<GroundingConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            GroundingConfig::default()
        }
    }
}

/// Data directory: `$STORYTAILOR_DATA_DIR`, else `~/.storytailor`, else
/// `./.storytailor`.
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from), dirs::home_dir())
}

fn data_dir_from(env_override: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_override.filter(|d| !d.as_os_str().is_empty()) {
        return dir;
    }
    home.unwrap_or_else(|| PathBuf::from("."))
        .join(".storytailor")
}

/// The API key from the environment, if set and non-empty.
pub fn api_key_from_env() -> Option<SecretString> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Some(SecretString::from(key)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storytailor_types::config::EmbeddingProvider;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, GroundingConfig::default());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
[embedding]
provider = "openai"
dimension = 1536

[verification]
verify_threshold = 0.7
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.verification.verify_threshold, 0.7);
        // untouched sections keep defaults
        assert_eq!(config.retrieval.n_results, 3);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "this is not { valid toml !!!")
            .await
            .unwrap();
        assert_eq!(load_config(tmp.path()).await, GroundingConfig::default());
    }

    #[test]
    fn data_dir_prefers_env_override() {
        let dir = data_dir_from(Some(PathBuf::from("/tmp/st")), Some(PathBuf::from("/home/u")));
        assert_eq!(dir, PathBuf::from("/tmp/st"));
    }

    #[test]
    fn data_dir_falls_back_to_home_then_cwd() {
        assert_eq!(
            data_dir_from(Some(PathBuf::new()), Some(PathBuf::from("/home/u"))),
            PathBuf::from("/home/u/.storytailor")
        );
        assert_eq!(data_dir_from(None, None), PathBuf::from("./.storytailor"));
    }
}
