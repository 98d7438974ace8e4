//! Subcommand execution against a session directory

use crate::cli::args::{Commands, parse_value};
use crate::cli::config::ConfigDiscovery;
use crate::env;
use crate::session::{
    FileSessionStore, IdScope, SessionConfig, SessionManager, SessionStore, cookie, identifier,
};
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Run one subcommand and return the text to print
pub async fn execute(command: Commands, config: SessionConfig) -> Result<String> {
    match command {
        Commands::Generate { length } => {
            let length = length.unwrap_or(config.id_length);
            if length == 0 || length > env::session::MAX_ID_LENGTH {
                bail!(
                    "Identifier length must be between 1 and {}",
                    env::session::MAX_ID_LENGTH
                );
            }
            Ok(identifier::generate(length))
        }
        Commands::List => {
            let store = FileSessionStore::from_config(&config)?;
            let ids = store.ids().await?;
            info!("Found {} sessions in {}", ids.len(), store.directory());
            Ok(ids.join("\n"))
        }
        Commands::Show { id } => {
            ensure_valid(&id)?;
            let store = FileSessionStore::from_config(&config)?;
            let record = store.load(&id).await;
            Ok(serde_json::to_string_pretty(record.data())?)
        }
        Commands::Get { id, key } => {
            ensure_valid(&id)?;
            let manager = SessionManager::new(config)?;
            let value = manager
                .start(Arc::new(IdScope::new(&id)), async {
                    manager.get(&key, Value::Null).await
                })
                .await;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        Commands::Set { id, key, value } => {
            ensure_valid(&id)?;
            let manager = SessionManager::new(config)?;
            let value = parse_value(&value);
            manager
                .start(Arc::new(IdScope::new(&id)), async {
                    manager.set(&key, value).await
                })
                .await
                .with_context(|| format!("Failed to set '{}' on session {}", key, id))?;
            Ok(format!("Set '{}' on session {}", key, id))
        }
        Commands::Destroy { id } => {
            ensure_valid(&id)?;
            let manager = SessionManager::new(config)?;
            manager
                .start(Arc::new(IdScope::new(&id)), async {
                    manager.destroy().await
                })
                .await;
            Ok(format!("Destroyed session {}", id))
        }
        Commands::Cookie { id } => {
            ensure_valid(&id)?;
            Ok(cookie::build_set_cookie(&id, &config, chrono::Utc::now()))
        }
        Commands::ShowConfig => {
            ConfigDiscovery::show_discovery_info();
            Ok(format!(
                "\nEffective configuration:\n{}",
                config.to_toml_string()?
            ))
        }
    }
}

fn ensure_valid(id: &str) -> Result<()> {
    if !identifier::is_valid(id) {
        bail!(
            "Invalid session identifier '{}': expected 1 to {} characters from [A-Za-z0-9_-]",
            id,
            env::session::MAX_ID_LENGTH
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;
    use tempfile::TempDir;

    fn config_for(temp_dir: &TempDir) -> SessionConfig {
        SessionConfig::new(
            env::test::TEST_SESSION_NAME,
            SessionOptions::with_directory(temp_dir.path().to_string_lossy().to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_get_show_destroy() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir);

        let set = Commands::Set {
            id: "abc".to_string(),
            key: "counter".to_string(),
            value: "2".to_string(),
        };
        execute(set, config.clone()).await.unwrap();

        let get = Commands::Get {
            id: "abc".to_string(),
            key: "counter".to_string(),
        };
        assert_eq!(execute(get, config.clone()).await.unwrap(), "2");

        let shown = execute(Commands::Show { id: "abc".to_string() }, config.clone())
            .await
            .unwrap();
        let shown: Value = serde_json::from_str(&shown).unwrap();
        assert_eq!(shown, serde_json::json!({"counter": 2}));

        assert_eq!(execute(Commands::List, config.clone()).await.unwrap(), "abc");

        execute(Commands::Destroy { id: "abc".to_string() }, config.clone())
            .await
            .unwrap();
        assert_eq!(execute(Commands::List, config).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_rejects_path_like_identifiers() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir);

        let result = execute(Commands::Show { id: "../etc".to_string() }, config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_generate_respects_length() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir);

        let id = execute(Commands::Generate { length: Some(12) }, config.clone())
            .await
            .unwrap();
        assert_eq!(id.len(), 12);
        assert!(identifier::is_valid(&id));

        let id = execute(Commands::Generate { length: None }, config.clone())
            .await
            .unwrap();
        assert_eq!(id.len(), env::session::DEFAULT_ID_LENGTH);

        assert!(
            execute(Commands::Generate { length: Some(0) }, config)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_cookie_command() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_for(&temp_dir);

        let header = execute(Commands::Cookie { id: "abc".to_string() }, config)
            .await
            .unwrap();
        assert!(header.starts_with("user=abc; Max-Age=2592000; Path=/; Expires="));
    }
}
