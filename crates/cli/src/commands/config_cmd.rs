//! `mira config`: Configuration management commands.

use mira_config::AppConfig;

const REDACTED: &str = "***";

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&redacted(config))?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_path().display());
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}

/// Replace every secret with a placeholder.
fn redacted(mut config: AppConfig) -> AppConfig {
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some(REDACTED.to_string());
        }
    };
    mask(&mut config.api_key);
    mask(&mut config.embedding.api_key);
    for provider in config.providers.values_mut() {
        mask(&mut provider.api_key);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use mira_config::ProviderConfig;

    #[test]
    fn config_path_is_valid() {
        assert!(config_path().to_str().unwrap().contains("config.toml"));
    }

    #[test]
    fn show_never_prints_keys() {
        let mut config = AppConfig::default();
        config.api_key = Some("gsk-secret".into());
        config.embedding.api_key = Some("emb-secret".into());
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-secret".into()),
                api_url: None,
                default_model: None,
            },
        );

        let out = toml::to_string_pretty(&redacted(config)).unwrap();
        assert!(!out.contains("secret"));
        assert!(out.contains(REDACTED));
    }

    #[test]
    fn unset_keys_stay_unset() {
        let config = redacted(AppConfig::default());
        assert!(config.api_key.is_none());
        assert!(config.embedding.api_key.is_none());
    }
}
