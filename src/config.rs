//! Runtime configuration, loaded from `marquee.toml` and the environment.

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::oscars::session::{DEFAULT_LANDING_URL, DEFAULT_YEARS_TO_OFFSET};
use crate::{bechdel, imdb};

pub const CONFIG_FILE: &str = "marquee.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Level for this crate's log events; other crates stay at `warn`.
    pub log_level: String,
    /// WebDriver server (geckodriver) used for the awards database session.
    pub webdriver_url: String,
    pub oscars_url: String,
    /// Fixed wait after submitting the awards search.
    #[serde(deserialize_with = "human_duration", serialize_with = "as_secs")]
    pub render_delay: Duration,
    /// Trailing non-year entries in the "years to" dropdown.
    pub years_to_offset: usize,
    /// Extra attempts at the whole scrape-and-extract step.
    pub scrape_retries: u32,
    #[serde(deserialize_with = "human_duration", serialize_with = "as_secs")]
    pub retry_delay: Duration,
    pub bechdel_url: String,
    pub imdb_base_url: String,
    pub imdb_datasets: Vec<String>,
    pub imdb_chunk_size: usize,
    #[serde(deserialize_with = "human_duration", serialize_with = "as_secs")]
    pub chunk_delay: Duration,
    pub staging_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            webdriver_url: "http://localhost:4444".to_string(),
            oscars_url: DEFAULT_LANDING_URL.to_string(),
            render_delay: Duration::from_secs(60),
            years_to_offset: DEFAULT_YEARS_TO_OFFSET,
            scrape_retries: 3,
            retry_delay: Duration::from_secs(10),
            bechdel_url: bechdel::DEFAULT_URL.to_string(),
            imdb_base_url: imdb::DEFAULT_BASE_URL.to_string(),
            imdb_datasets: imdb::DEFAULT_DATASETS.iter().map(|s| s.to_string()).collect(),
            imdb_chunk_size: 50_000,
            chunk_delay: Duration::from_secs(5),
            staging_dir: PathBuf::from("staging"),
        }
    }
}

impl Config {
    /// Defaults, overridden by `marquee.toml` (if present), overridden by env vars.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::raw().only(&Self::KEYS))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    const KEYS: [&'static str; 13] = [
        "log_level",
        "webdriver_url",
        "oscars_url",
        "render_delay",
        "years_to_offset",
        "scrape_retries",
        "retry_delay",
        "bechdel_url",
        "imdb_base_url",
        "imdb_datasets",
        "imdb_chunk_size",
        "chunk_delay",
        "staging_dir",
    ];
}

/// Accepts `"60s"`, `"1.5m"`, `"500ms"` or a bare number of seconds.
fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

fn as_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

/// Parse a human duration string such as `"90s"` or `"2m"`.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    fundu::parse_duration(text.trim()).map_err(|e| format!("invalid duration '{text}': {e}"))
}
