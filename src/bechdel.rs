//! bechdeltest.com API client: one flat row per rated film.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::info;

use crate::json::decode_json;

pub const DEFAULT_URL: &str = "http://bechdeltest.com/api/v1/getAllMovies";

/// A film and its Bechdel test score.
///
/// `rating` is the number of criteria passed, 0 through 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BechdelMovie {
    #[serde(deserialize_with = "number_or_string")]
    pub id: i64,
    /// IMDB id without the `tt` prefix, leading zeros kept.
    #[serde(rename = "imdbid", default)]
    pub imdb_id: Option<String>,
    pub title: String,
    #[serde(deserialize_with = "number_or_string")]
    pub year: i64,
    #[serde(deserialize_with = "number_or_string")]
    pub rating: i64,
}

/// The API has served integers both bare and quoted over the years.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub struct BechdelClient {
    http: reqwest::Client,
    url: String,
}

impl BechdelClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .context("Failed to build reqwest client")?,
            url: url.into(),
        })
    }

    /// Fetch every film the API knows about.
    pub async fn fetch_all_movies(&self) -> Result<Vec<BechdelMovie>> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", self.url))?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            anyhow::bail!("Bechdel API request failed ({status}): {body}");
        }

        let movies = parse_movies(&body)?;
        info!(total = movies.len(), "Fetched Bechdel test scores");
        Ok(movies)
    }
}

pub fn parse_movies(body: &str) -> Result<Vec<BechdelMovie>> {
    decode_json(body).context("Failed to parse Bechdel API response")
}
