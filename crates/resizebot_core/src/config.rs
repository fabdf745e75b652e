use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str = "resizebot/0.2 (https://meta.wikimedia.org/wiki/User:LRBot)";
pub const DEFAULT_WORK_DIR: &str = "tmp";
pub const DEFAULT_DB_PATH: &str = "sqlite3.db";
pub const DEFAULT_SLEEP_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BotConfig {
    #[serde(default)]
    pub bot: BotSection,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BotSection {
    pub work_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub sleep_secs: Option<u64>,
    pub user_agent: Option<String>,
    /// Site keys to process; empty means every known site.
    #[serde(default)]
    pub sites: Vec<String>,
}

/// One `[[site]]` table. Matches a built-in profile by `key` and overrides
/// only the fields it sets; unknown keys define a new site.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SiteSection {
    pub key: String,
    pub api_url: Option<String>,
    pub user_namespace: Option<String>,
    pub template_name: Option<String>,
    #[serde(default)]
    pub template_aliases: Vec<String>,
    pub template_pattern: Option<String>,
    pub upload_description: Option<String>,
    pub log_section: Option<String>,
    pub success: Option<String>,
    pub success_log: Option<String>,
    pub params_error: Option<String>,
    pub download_error: Option<String>,
    pub upload_error: Option<String>,
    pub size_error: Option<String>,
    pub format_error: Option<String>,
}

impl SiteSection {
    pub fn merged_with(&self, overlay: &SiteSection) -> SiteSection {
        fn pick(overlay: &Option<String>, base: &Option<String>) -> Option<String> {
            overlay.clone().or_else(|| base.clone())
        }

        let mut template_aliases = self.template_aliases.clone();
        template_aliases.extend(overlay.template_aliases.iter().cloned());

        SiteSection {
            key: self.key.clone(),
            api_url: pick(&overlay.api_url, &self.api_url),
            user_namespace: pick(&overlay.user_namespace, &self.user_namespace),
            template_name: pick(&overlay.template_name, &self.template_name),
            template_aliases,
            template_pattern: pick(&overlay.template_pattern, &self.template_pattern),
            upload_description: pick(&overlay.upload_description, &self.upload_description),
            log_section: pick(&overlay.log_section, &self.log_section),
            success: pick(&overlay.success, &self.success),
            success_log: pick(&overlay.success_log, &self.success_log),
            params_error: pick(&overlay.params_error, &self.params_error),
            download_error: pick(&overlay.download_error, &self.download_error),
            upload_error: pick(&overlay.upload_error, &self.upload_error),
            size_error: pick(&overlay.size_error, &self.size_error),
            format_error: pick(&overlay.format_error, &self.format_error),
        }
    }
}

impl BotConfig {
    /// Resolve user agent: env WIKI_USER_AGENT > config > DEFAULT_USER_AGENT.
    pub fn user_agent(&self) -> String {
        if let Ok(value) = env::var("WIKI_USER_AGENT") {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return trimmed;
            }
        }
        self.bot
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.bot.sleep_secs.unwrap_or(DEFAULT_SLEEP_SECS))
    }

    /// Scratch directory for downloads and thumbnails, relative to `base`.
    pub fn work_dir(&self, base: &Path) -> PathBuf {
        resolve_against(
            base,
            self.bot
                .work_dir
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_WORK_DIR)),
        )
    }

    pub fn db_path(&self, base: &Path) -> PathBuf {
        resolve_against(
            base,
            self.bot
                .db_path
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_DB_PATH)),
        )
    }
}

/// Load and parse a BotConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<BotConfig> {
    if !config_path.exists() {
        return Ok(BotConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: BotConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Directory that relative paths in the config file are resolved against.
pub fn config_base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn resolve_against(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_config_returns_default_for_missing_file() {
        let config = load_config(Path::new("/nonexistent/resizebot.toml")).expect("load config");
        assert_eq!(config, BotConfig::default());
        assert_eq!(config.sleep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn load_config_parses_bot_and_site_sections() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("resizebot.toml");
        fs::write(
            &config_path,
            r#"
[bot]
work_dir = "scratch"
db_path = "/var/lib/resizebot/audit.db"
sleep_secs = 15
user_agent = "test-agent/1.0"
sites = ["uk.wikipedia"]

[[site]]
key = "uk.wikipedia"
api_url = "https://uk.example.org/w/api.php"
template_aliases = ["Шаблон:Resize"]
"#,
        )
        .expect("write config");

        let config = load_config(&config_path).expect("load config");
        let base = config_base_dir(&config_path);
        assert_eq!(config.work_dir(&base), temp.path().join("scratch"));
        assert_eq!(
            config.db_path(&base),
            PathBuf::from("/var/lib/resizebot/audit.db")
        );
        assert_eq!(config.sleep_interval(), Duration::from_secs(15));
        assert_eq!(config.bot.sites, vec!["uk.wikipedia".to_string()]);
        assert_eq!(config.sites.len(), 1);
        assert_eq!(
            config.sites[0].api_url.as_deref(),
            Some("https://uk.example.org/w/api.php")
        );
        assert_eq!(config.sites[0].template_aliases, vec!["Шаблон:Resize"]);
    }

    #[test]
    fn load_config_returns_error_for_invalid_toml() {
        let temp = tempdir().expect("tempdir");
        let config_path = temp.path().join("resizebot.toml");
        fs::write(&config_path, "[bot\nsleep_secs = 1").expect("write config");
        let error = load_config(&config_path).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn merged_section_prefers_overlay_values() {
        let base = SiteSection {
            key: "uk.wikipedia".to_string(),
            success: Some("base".to_string()),
            log_section: Some("Log".to_string()),
            template_aliases: vec!["A:B".to_string()],
            ..SiteSection::default()
        };
        let overlay = SiteSection {
            key: "uk.wikipedia".to_string(),
            success: Some("overlay".to_string()),
            template_aliases: vec!["C:D".to_string()],
            ..SiteSection::default()
        };
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.success.as_deref(), Some("overlay"));
        assert_eq!(merged.log_section.as_deref(), Some("Log"));
        assert_eq!(merged.template_aliases, vec!["A:B", "C:D"]);
    }

    #[test]
    fn config_base_dir_defaults_to_current_dir() {
        assert_eq!(config_base_dir(Path::new("resizebot.toml")), PathBuf::from("."));
    }
}
