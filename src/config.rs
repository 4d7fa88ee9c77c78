use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::MonthKey;
use crate::error::SeriesError;

pub const DEFAULT_CONFIG_FILE: &str = "geospace.json";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_DST_URL_TEMPLATE: &str =
    "https://wdc.kugi.kyoto-u.ac.jp/dst_final/{yyyy}{mm}/index-j.html";
pub const DEFAULT_SUNSPOT_URL: &str = "https://solarwww.mtk.nao.ac.jp/jp/db/mtkmonthly.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub dst_url_template: Option<String>,
    #[serde(default)]
    pub sunspot_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub figure: Option<FigureEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FigureEntry {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub dpi: Option<f64>,
}

/// Figure geometry handed to the renderer. Sizes are in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 6.4,
            height: 4.8,
            dpi: 100.0,
        }
    }
}

/// Where each dataset is downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    dst_url_template: String,
    sunspot_url: String,
}

impl Sources {
    /// `dst_url_template` must contain `{yyyy}` and `{mm}`.
    pub fn new(dst_url_template: String, sunspot_url: String) -> Result<Self, SeriesError> {
        if !dst_url_template.contains("{yyyy}") || !dst_url_template.contains("{mm}") {
            return Err(SeriesError::ConfigParse(format!(
                "dst_url_template needs {{yyyy}} and {{mm}}: {dst_url_template}"
            )));
        }
        for url in [&dst_url_template, &sunspot_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SeriesError::InvalidUrl(url.clone()));
            }
        }
        Ok(Self {
            dst_url_template,
            sunspot_url,
        })
    }

    pub fn dst_url(&self, key: MonthKey) -> String {
        self.dst_url_template
            .replace("{yyyy}", &format!("{:04}", key.year()))
            .replace("{mm}", &format!("{:02}", key.month()))
    }

    pub fn sunspot_url(&self) -> &str {
        &self.sunspot_url
    }
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            dst_url_template: DEFAULT_DST_URL_TEMPLATE.to_string(),
            sunspot_url: DEFAULT_SUNSPOT_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub cache_dir: Utf8PathBuf,
    pub sources: Sources,
    /// `None` waits on the server indefinitely.
    pub timeout: Option<Duration>,
    pub figure: FigureConfig,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `geospace.json` in the working directory when it
    /// exists. Without either, defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SeriesError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SeriesError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SeriesError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SeriesError> {
        let cache_dir = Utf8PathBuf::from(
            config
                .cache_dir
                .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()),
        );

        let sources = Sources::new(
            config
                .dst_url_template
                .unwrap_or_else(|| DEFAULT_DST_URL_TEMPLATE.to_string()),
            config
                .sunspot_url
                .unwrap_or_else(|| DEFAULT_SUNSPOT_URL.to_string()),
        )?;

        let timeout = match config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let defaults = FigureConfig::default();
        let figure = config.figure.unwrap_or_default();
        let figure = FigureConfig {
            width: figure.width.unwrap_or(defaults.width),
            height: figure.height.unwrap_or(defaults.height),
            dpi: figure.dpi.unwrap_or(defaults.dpi),
        };
        validate_figure(&figure)?;

        Ok(ResolvedConfig {
            cache_dir,
            sources,
            timeout,
            figure,
        })
    }
}

pub fn validate_figure(figure: &FigureConfig) -> Result<(), SeriesError> {
    let positive = |value: f64| value.is_finite() && value > 0.0;
    if !positive(figure.width) || !positive(figure.height) || !positive(figure.dpi) {
        return Err(SeriesError::ConfigParse(format!(
            "figure width, height and dpi must be positive: {figure:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.cache_dir, Utf8PathBuf::from("cache"));
        assert_eq!(resolved.timeout, Some(Duration::from_secs(60)));
        assert_eq!(resolved.figure, FigureConfig::default());
        assert_eq!(resolved.sources, Sources::default());
    }
}
