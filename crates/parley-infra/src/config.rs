//! Configuration loader for Parley.
//!
//! Reads `config.toml` and deserializes it into [`RelayConfig`]. A missing
//! file yields the defaults; a file that exists but cannot be read or
//! parsed is an error, as is a configuration that fails validation.

use std::path::{Path, PathBuf};

use parley_types::config::RelayConfig;
use parley_types::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "PARLEY_CONFIG";

/// The config file location: `$PARLEY_CONFIG`, else
/// `<config_dir>/parley/config.toml`, else `./parley.toml`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("parley").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("parley.toml"))
}

/// Load and validate configuration from `path`.
pub async fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(RelayConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    let config = parse_config(&content).map_err(|err| match err {
        ConfigError::Parse { message, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })?;

    tracing::debug!(
        path = %path.display(),
        mode = %config.upstream.mode,
        model = %config.upstream.resolved_model(),
        "loaded configuration"
    );
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    let config: RelayConfig = toml::from_str(content).map_err(|err| ConfigError::Parse {
        path: "<inline>".to_string(),
        message: err.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Render `config` as TOML. The config holds no credentials.
pub fn render_config(config: &RelayConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|err| ConfigError::Invalid(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::completion::CompletionMode;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).await.unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
[upstream]
mode = "legacy"
model = "text-curie-001"

[conversation]
ttl_secs = 300
history_window = 4

[telegram]
poll_timeout_secs = 25
"#,
        )
        .await
        .unwrap();

        let config = load_config(&config_path).await.unwrap();
        assert_eq!(config.upstream.mode, CompletionMode::Legacy);
        assert_eq!(config.upstream.resolved_model(), "text-curie-001");
        assert_eq!(config.conversation.ttl_secs, 300);
        assert_eq!(config.conversation.history_window, 4);
        assert_eq!(config.telegram.poll_timeout_secs, 25);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let err = load_config(&config_path).await.unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert!(path.ends_with("config.toml")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_config_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "[conversation]\nhistory_window = 3\n")
            .await
            .unwrap();

        let err = load_config(&config_path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[tokio::test]
    async fn load_config_directory_is_a_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(tmp.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn render_then_parse_keeps_values() {
        let mut config = RelayConfig::default();
        config.conversation.record_failed_turns = true;
        config.upstream.model = Some("gpt-4o-mini".to_string());

        let rendered = render_config(&config).unwrap();
        assert!(rendered.contains("[upstream]"));
        assert_eq!(parse_config(&rendered).unwrap(), config);
    }
}
