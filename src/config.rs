use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Persisted preferences. Written with defaults on first run so the
/// server URL is easy to find and edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        log::info!("Settings saved to: {}", path.display());
        Ok(())
    }
}

pub fn settings_path() -> Result<PathBuf> {
    let home_dir = home::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;

    Ok(home_dir.join(".config").join("authgate").join("settings.json"))
}

#[derive(Debug, Parser)]
#[command(name = "authgate", about = "Terminal client for the auth service")]
pub struct Cli {
    /// Base URL of the auth server
    #[arg(long, env = "AUTHGATE_SERVER")]
    pub server: Option<String>,

    /// Password reset token from the emailed link
    #[arg(long, env = "AUTHGATE_RESET_TOKEN")]
    pub reset_token: Option<String>,
}

/// Resolved startup configuration. The reset token is the terminal
/// analog of the `?token=` query parameter on the reset link: read once
/// at startup, never persisted.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub reset_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let cli = Cli::parse();

        let path = settings_path()?;
        let settings = match Settings::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "Failed to load settings from {}: {}, using defaults",
                    path.display(),
                    e
                );
                Settings::default()
            }
        };
        if !path.exists() {
            if let Err(e) = settings.save_to(&path) {
                log::warn!("Failed to write default settings: {}", e);
            }
        }

        Ok(Self::resolve(cli, &settings))
    }

    /// Flags and environment (handled by clap) win over the settings
    /// file.
    pub fn resolve(cli: Cli, settings: &Settings) -> Self {
        Self {
            server_url: cli.server.unwrap_or_else(|| settings.server_url.clone()),
            reset_token: cli.reset_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("authgate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_flags_fall_back_to_settings() {
        let config = Config::resolve(parse(&[]), &Settings::default());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.reset_token.is_none());
    }

    #[test]
    fn space_separated_flags_are_accepted() {
        let config = Config::resolve(
            parse(&["--server", "http://flag:3000", "--reset-token", "xyz"]),
            &Settings::default(),
        );
        assert_eq!(config.server_url, "http://flag:3000");
        assert_eq!(config.reset_token.as_deref(), Some("xyz"));
    }

    #[test]
    fn equals_flag_syntax_is_accepted() {
        let config = Config::resolve(
            parse(&["--server=http://flag:3000", "--reset-token=xyz"]),
            &Settings::default(),
        );
        assert_eq!(config.server_url, "http://flag:3000");
        assert_eq!(config.reset_token.as_deref(), Some("xyz"));
    }

    #[test]
    fn flags_beat_the_settings_file() {
        let settings = Settings {
            server_url: "http://settings:3000".to_string(),
        };
        let config = Config::resolve(parse(&["--server", "http://flag:3000"]), &settings);
        assert_eq!(config.server_url, "http://flag:3000");
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["authgate", "--verbose"]).is_err());
    }
}
