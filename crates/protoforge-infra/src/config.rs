//! Configuration loader and data-directory resolution for Protoforge.
//!
//! Reads `config.toml` from the data directory (`~/.protoforge/` by default)
//! and deserializes it into [`OlcConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use protoforge_types::config::OlcConfig;

/// Resolve the data directory.
///
/// Priority:
/// 1. `PROTOFORGE_DATA_DIR` environment variable
/// 2. `~/.protoforge`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PROTOFORGE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".protoforge");
    }

    PathBuf::from(".protoforge")
}

/// Load the wizard configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`OlcConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - Empty `typeclasses` list: the defaults are kept, since a prototype
///   must be able to name at least one typeclass.
pub async fn load_olc_config(data_dir: &Path) -> OlcConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return OlcConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return OlcConfig::default();
        }
    };

    match toml::from_str::<OlcConfig>(&content) {
        Ok(mut config) => {
            if config.typeclasses.is_empty() {
                tracing::warn!("{} lists no typeclasses, using defaults", config_path.display());
                config.typeclasses = OlcConfig::default().typeclasses;
            }
            if config.list_page_size == 0 {
                config.list_page_size = 1;
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            OlcConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_olc_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_olc_config(tmp.path()).await;
        assert_eq!(config.default_home, "#2");
        assert_eq!(config.typeclasses.len(), 4);
    }

    #[tokio::test]
    async fn load_olc_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
crop_width = 20
list_page_size = 5

[[typeclasses]]
path = "typeclasses.weapons.Sword"
doc = "Pointy."
"#,
        )
        .await
        .unwrap();

        let config = load_olc_config(tmp.path()).await;
        assert_eq!(config.crop_width, 20);
        assert_eq!(config.list_page_size, 5);
        assert_eq!(config.typeclasses.len(), 1);
        assert_eq!(config.typeclasses[0].doc, "Pointy.");
    }

    #[tokio::test]
    async fn load_olc_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_olc_config(tmp.path()).await;
        assert_eq!(config.crop_width, 15);
    }

    #[tokio::test]
    async fn load_olc_config_empty_typeclasses_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "typeclasses = []\nlist_page_size = 0\n")
            .await
            .unwrap();

        let config = load_olc_config(tmp.path()).await;
        assert_eq!(config.typeclasses.len(), 4);
        assert_eq!(config.list_page_size, 1);
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("PROTOFORGE_DATA_DIR", "/tmp/test-protoforge");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-protoforge"));
        unsafe {
            std::env::remove_var("PROTOFORGE_DATA_DIR");
        }
    }
}
