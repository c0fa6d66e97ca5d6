use anyhow::{anyhow, ensure, Context};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::util::url::validate_feed_url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub source_url: String,
    pub self_url: Option<String>,
    pub image_url: String,
    pub output_path: String,
    pub explicit: String,
    pub locked: String,
    pub format_descriptions: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_url: "https://feeds.soundcloud.com/users/soundcloud:users:100329/sounds.rss"
                .to_string(),
            self_url: Some("https://djstevekelley.github.io/celestial-feed/feed.xml".to_string()),
            image_url:
                "https://djstevekelley.github.io/celestial-feed/Celestial_Podcast_Cover_3000x3000.jpg"
                    .to_string(),
            output_path: "feed.xml".to_string(),
            explicit: "no".to_string(),
            locked: "no".to_string(),
            format_descriptions: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: "FeedRewriter/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub link_urls: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/feed-rewriter.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub http_client: HttpClientConfig,
    pub formatter: FormatterConfig,
    pub logging: LoggingConfig,
}

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["config/config.yaml", "../config/config.yaml"];

impl AppConfig {
    /// Load the YAML config (`CONFIG_FILE` or a default location), apply
    /// environment overrides, then validate.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = match config_path()? {
            Some(path) => Self::load_from_file(&path)?,
            None => AppConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validated()
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {:?}", path))
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let feed = &mut self.feed;
        if let Some(url) = lookup("FEED_SOURCE_URL") {
            feed.source_url = url;
        }
        if let Some(url) = lookup("FEED_SELF_URL") {
            feed.self_url = Some(url).filter(|url| !url.trim().is_empty());
        }
        if let Some(url) = lookup("FEED_IMAGE_URL") {
            feed.image_url = url;
        }
        if let Some(path) = lookup("FEED_OUTPUT_PATH") {
            feed.output_path = path;
        }
        if let Some(flag) = flag_override(&lookup, "FEED_FORMAT_DESCRIPTIONS")? {
            feed.format_descriptions = flag;
        }

        if let Some(raw) = lookup("FETCH_TIMEOUT_SECS") {
            self.http_client.request_timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("FETCH_TIMEOUT_SECS must be whole seconds, got {raw:?}"))?;
        }
        if let Some(user_agent) = lookup("FETCH_USER_AGENT") {
            self.http_client.user_agent = user_agent;
        }

        if let Some(flag) = flag_override(&lookup, "FORMAT_LINK_URLS")? {
            self.formatter.link_urls = flag;
        }

        if let Some(log_file) = lookup("LOG_FILE_PATH") {
            self.logging.file = log_file;
        }
        if let Some(log_level) = lookup("LOG_LEVEL") {
            self.logging.level = Some(log_level);
        }

        Ok(())
    }

    /// Normalize URLs and reject settings the rewrite cannot work with.
    pub fn validated(mut self) -> anyhow::Result<Self> {
        self.feed.source_url =
            validate_feed_url(&self.feed.source_url).context("feed.source_url is invalid")?;
        self.feed.image_url =
            validate_feed_url(&self.feed.image_url).context("feed.image_url is invalid")?;
        self.feed.self_url = self
            .feed
            .self_url
            .as_deref()
            .map(validate_feed_url)
            .transpose()
            .context("feed.self_url is invalid")?;

        if self.feed.output_path.trim().is_empty() {
            return Err(anyhow!(
                "output path missing; set FEED_OUTPUT_PATH env var or feed.output_path in config file"
            ));
        }

        if self.http_client.request_timeout_secs == 0 {
            self.http_client.request_timeout_secs = HttpClientConfig::default().request_timeout_secs;
        }

        Ok(self)
    }
}

/// `CONFIG_FILE` must exist when set; otherwise the first default location
/// present on disk is used, if any.
fn config_path() -> anyhow::Result<Option<PathBuf>> {
    if let Ok(path) = std::env::var("CONFIG_FILE") {
        let path = PathBuf::from(path);
        ensure!(path.exists(), "config file {:?} not found", path);
        return Ok(Some(path));
    }

    Ok(DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists()))
}

fn flag_override<F>(lookup: &F, key: &str) -> anyhow::Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            parse_flag(&raw)
                .ok_or_else(|| anyhow!("{key} must be one of true/false/yes/no/on/off/1/0"))
        })
        .transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{parse_flag, AppConfig};

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default().validated().unwrap();
        assert_eq!(config.feed.output_path, "feed.xml");
        assert_eq!(config.feed.explicit, "no");
        assert!(config.feed.format_descriptions);
        assert!(!config.formatter.link_urls);
        assert_eq!(config.http_client.request_timeout_secs, 30);
        assert!(config.feed.self_url.is_some());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
feed:
  source_url: "https://example.com/podcast.rss"
  self_url: null
formatter:
  link_urls: true
http_client:
  request_timeout_secs: 0
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let config = config.validated().unwrap();

        assert_eq!(config.feed.source_url, "https://example.com/podcast.rss");
        assert!(config.feed.self_url.is_none());
        assert!(config.formatter.link_urls);
        assert_eq!(config.http_client.request_timeout_secs, 30);
        assert_eq!(config.logging.file, "logs/feed-rewriter.log");
        assert!(config.feed.image_url.ends_with("Celestial_Podcast_Cover_3000x3000.jpg"));
    }

    #[test]
    fn test_invalid_urls_and_paths_are_rejected() {
        let mut config = AppConfig::default();
        config.feed.image_url = "cover.jpg".to_string();
        assert!(config.validated().is_err());

        let mut config = AppConfig::default();
        config.feed.output_path = "  ".to_string();
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_parse_flag_values() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_env_overrides_apply_on_top_of_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FEED_SELF_URL", ""),
            ("FEED_OUTPUT_PATH", "public/feed.xml"),
            ("FEED_FORMAT_DESCRIPTIONS", "off"),
            ("FETCH_TIMEOUT_SECS", " 45 "),
            ("FORMAT_LINK_URLS", "yes"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();

        assert!(config.feed.self_url.is_none());
        assert_eq!(config.feed.output_path, "public/feed.xml");
        assert!(!config.feed.format_descriptions);
        assert_eq!(config.http_client.request_timeout_secs, 45);
        assert!(config.formatter.link_urls);
    }

    #[test]
    fn test_bad_override_values_are_errors() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_overrides(|key| (key == "FETCH_TIMEOUT_SECS").then(|| "soon".to_string()))
            .is_err());

        let mut config = AppConfig::default();
        assert!(config
            .apply_overrides(|key| (key == "FORMAT_LINK_URLS").then(|| "maybe".to_string()))
            .is_err());
    }
}
