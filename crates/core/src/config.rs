use serde::{Deserialize, Serialize};

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub media: String,
    pub limit: u32,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://itunes.apple.com".to_string(),
            media: "music".to_string(),
            limit: 50,
            timeout_ms: 10_000,
            user_agent: concat!("guess-that-song/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "ffplay".to_string(),
            args: vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            search: SearchConfig::default(),
            playback: PlaybackConfig::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [search]
            limit = 25
            "#,
        )
        .unwrap();

        assert_eq!(cfg.schema_version, 1);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.search.limit, 25);
        assert_eq!(cfg.search.base_url, "https://itunes.apple.com");
        assert_eq!(cfg.search.media, "music");
        assert!(cfg.playback.enabled);
        assert_eq!(cfg.playback.command, "ffplay");
    }

    #[test]
    fn default_config_survives_toml() {
        let text = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();

        assert_eq!(back.search.limit, 50);
        assert_eq!(back.playback.args, vec!["-nodisp", "-autoexit", "-loglevel", "quiet"]);
        assert_eq!(back.log_level, "warn");
    }
}
