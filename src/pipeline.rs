//! Orchestration of the extract & stage flows.
//!
//! Each flow pulls one source and writes its tables into the staging area.
//! Retrying the awards scrape lives here, around the whole
//! scrape-and-extract step; neither the session driver nor the extractor
//! retries on its own.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::bechdel::BechdelClient;
use crate::config::Config;
use crate::imdb::{self, ChunkOptions, ImdbClient};
use crate::oscars::{self, AwardRecord, ScrapeError, SearchForm};
use crate::stage::{BECHDEL_KEY, OSCARS_KEY, StagingArea};
use crate::utils::fmt_duration;

/// Saved-file names looked up by [`Pipeline::seed_from_dir`].
pub const SAVED_OSCARS_FILE: &str = "oscars_awards.csv";
pub const SAVED_BECHDEL_FILE: &str = "bechdel_test_movies.csv";

pub struct Pipeline {
    config: Config,
    stage: StagingArea,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        let stage = StagingArea::new(config.staging_dir.clone());
        Self { config, stage }
    }

    pub fn stage(&self) -> &StagingArea {
        &self.stage
    }

    fn search_form(&self) -> SearchForm {
        SearchForm::new(self.config.oscars_url.clone(), self.config.years_to_offset)
    }

    /// Scrape the awards database and extract its rows, retrying failed attempts.
    pub async fn scrape_oscars(&self, delay: Duration) -> Result<Vec<AwardRecord>, ScrapeError> {
        let form = &self.search_form();
        let webdriver_url = self.config.webdriver_url.as_str();

        retry_scrape(self.config.scrape_retries, self.config.retry_delay, move |_| async move {
            let markup = oscars::scrape_oscars_page(webdriver_url, form, delay).await?;
            require_records(oscars::extract_award_records(&markup)?)
        })
        .await
    }

    pub async fn run_oscars(&self, delay: Duration) -> Result<usize> {
        let records = self
            .scrape_oscars(delay)
            .await
            .context("Failed to scrape Oscars data")?;
        let rows = self.stage.put_csv(OSCARS_KEY, &records)?;
        info!(rows, key = OSCARS_KEY, "Staged Oscars awards");
        Ok(rows)
    }

    pub async fn run_bechdel(&self) -> Result<usize> {
        let client = BechdelClient::new(self.config.bechdel_url.clone())?;
        let movies = client.fetch_all_movies().await?;
        let rows = self.stage.put_csv(BECHDEL_KEY, &movies)?;
        info!(rows, key = BECHDEL_KEY, "Staged Bechdel scores");
        Ok(rows)
    }

    /// Ingest `datasets`, or the configured list when empty. Returns total parts staged.
    pub async fn run_imdb(&self, datasets: &[String], chunk_size: Option<usize>) -> Result<usize> {
        let datasets = if datasets.is_empty() {
            &self.config.imdb_datasets
        } else {
            datasets
        };
        let options = ChunkOptions {
            chunk_size: chunk_size.unwrap_or(self.config.imdb_chunk_size),
            chunk_delay: self.config.chunk_delay,
        };
        anyhow::ensure!(options.chunk_size > 0, "IMDB chunk size must be positive");
        let client = ImdbClient::new(&self.config.imdb_base_url)?;

        let mut total_parts = 0;
        for dataset in datasets {
            let parts = imdb::ingest_dataset(&client, &self.stage, dataset, options)
                .await
                .with_context(|| format!("Failed to ingest IMDB dataset {dataset}"))?;
            info!(dataset = dataset.as_str(), parts, "Staged IMDB dataset");
            total_parts += parts;
        }
        Ok(total_parts)
    }

    /// Oscars, Bechdel and IMDB in order; the first failure stops the run.
    pub async fn run_all(&self) -> Result<()> {
        let start = Instant::now();
        self.run_oscars(self.config.render_delay).await?;
        self.run_bechdel().await?;
        self.run_imdb(&[], None).await?;
        info!(duration = fmt_duration(start.elapsed()), "All flows complete");
        Ok(())
    }

    /// Stage saved Oscars/Bechdel CSVs instead of scraping them.
    pub fn seed_from_dir(&self, dir: &Path) -> Result<()> {
        for (file, key) in [
            (SAVED_OSCARS_FILE, OSCARS_KEY),
            (SAVED_BECHDEL_FILE, BECHDEL_KEY),
        ] {
            let bytes = self.stage.put_file(&dir.join(file), key)?;
            info!(file, key, bytes, "Staged saved dataset");
        }
        Ok(())
    }

    /// Fallback flow for when the browser scrape is unavailable.
    pub async fn run_seeded(&self, dir: &Path) -> Result<()> {
        self.seed_from_dir(dir)?;
        self.run_imdb(&[], None).await?;
        Ok(())
    }

    /// Extract rows from a saved results page; stage them, or print CSV to stdout.
    pub fn extract_file(&self, input: &Path, to_stdout: bool) -> Result<usize> {
        let markup = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let records = require_records(oscars::extract_award_records(&markup)?)
            .with_context(|| format!("Nothing to extract from {}", input.display()))?;

        if to_stdout {
            let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
            for record in &records {
                writer.serialize(record)?;
            }
            writer.flush()?;
            Ok(records.len())
        } else {
            self.stage.put_csv(OSCARS_KEY, &records)
        }
    }
}

/// A results page without a single award row is treated as a failed scrape.
pub fn require_records(records: Vec<AwardRecord>) -> Result<Vec<AwardRecord>, ScrapeError> {
    if records.is_empty() {
        return Err(ScrapeError::NoResults);
    }
    Ok(records)
}

/// Run `attempt` until it succeeds, it fails with a non-retryable error, or
/// `retries` extra attempts have been spent.
pub async fn retry_scrape<T, F, Fut>(
    retries: u32,
    delay: Duration,
    mut attempt: F,
) -> Result<T, ScrapeError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut tries = 0;
    loop {
        match attempt(tries).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && tries < retries => {
                tries += 1;
                warn!(
                    attempt = tries,
                    retries,
                    error = %e,
                    delay = fmt_duration(delay),
                    "Scrape attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn navigation_error() -> ScrapeError {
        ScrapeError::Navigation {
            step: "submit search",
            locator: "xpath //*[@id=\"btnbasicsearch\"]".to_string(),
            source: anyhow::anyhow!("no such element"),
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = Cell::new(0);
        let result = retry_scrape(3, Duration::ZERO, |n| {
            calls.set(calls.get() + 1);
            async move { if n < 2 { Err(navigation_error()) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_scrape(2, Duration::ZERO, |_| {
            calls.set(calls.get() + 1);
            async { Err(navigation_error()) }
        })
        .await;

        assert!(matches!(result, Err(ScrapeError::Navigation { .. })));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_malformed_title_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = retry_scrape(3, Duration::ZERO, |_| {
            calls.set(calls.get() + 1);
            async {
                Err(ScrapeError::MalformedGroupTitle {
                    title: "Ceremony".to_string(),
                    reason: "expected exactly two whitespace-separated tokens",
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ScrapeError::MalformedGroupTitle { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_unrendered_page_is_retried() {
        let calls = Cell::new(0);
        let result = retry_scrape(3, Duration::ZERO, |_| {
            calls.set(calls.get() + 1);
            async { require_records(oscars::extract_award_records("<html>Loading</html>")?) }
        })
        .await;

        assert!(matches!(result, Err(ScrapeError::NoResults)));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_extract_file_without_results_stages_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("loading.html");
        std::fs::write(&input, "<html><body>Loading...</body></html>").unwrap();

        let pipeline = Pipeline::new(Config {
            staging_dir: dir.path().join("staging"),
            ..Config::default()
        });

        assert!(pipeline.extract_file(&input, false).is_err());
        assert!(!pipeline.stage().root().join(OSCARS_KEY).exists());
    }

    #[tokio::test]
    async fn test_run_imdb_rejects_zero_chunk_size_before_download() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(Config {
            staging_dir: dir.path().join("staging"),
            imdb_base_url: "http://127.0.0.1:9/".to_string(),
            ..Config::default()
        });

        let err = pipeline.run_imdb(&[], Some(0)).await.unwrap_err();
        assert!(err.to_string().contains("chunk size"));
        assert!(!pipeline.stage().root().exists());
    }

    #[test]
    fn test_seed_from_dir_stages_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("datasets");
        std::fs::create_dir_all(&saved).unwrap();
        std::fs::write(saved.join(SAVED_OSCARS_FILE), "award_year\n2023\n").unwrap();
        std::fs::write(saved.join(SAVED_BECHDEL_FILE), "id\n1\n").unwrap();

        let pipeline = Pipeline::new(Config {
            staging_dir: dir.path().join("staging"),
            ..Config::default()
        });
        pipeline.seed_from_dir(&saved).unwrap();

        let root = pipeline.stage().root();
        assert!(root.join(OSCARS_KEY).exists());
        assert_eq!(
            std::fs::read_to_string(root.join(BECHDEL_KEY)).unwrap(),
            "id\n1\n"
        );
    }

    #[test]
    fn test_seed_from_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(Config {
            staging_dir: dir.path().join("staging"),
            ..Config::default()
        });
        assert!(pipeline.seed_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_extract_file_stages_records() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("results.html");
        std::fs::write(
            &input,
            r#"<div id="resultscontainer">
                <div class="awards-result-chron result-group group-awardcategory-chron">
                    <div class="result-group-title">2022 (94th)</div>
                    <div class="result-subgroup subgroup-awardcategory-chron">
                        <div class="result-subgroup-title">BEST PICTURE</div>
                        <span title="Winner"></span>
                        <div><div class="awards-result-film-title">CODA</div></div>
                        <div class="awards-result-film-title">Dune</div>
                    </div>
                </div>
            </div>"#,
        )
        .unwrap();

        let pipeline = Pipeline::new(Config {
            staging_dir: dir.path().join("staging"),
            ..Config::default()
        });
        assert_eq!(pipeline.extract_file(&input, false).unwrap(), 2);

        let staged = std::fs::read_to_string(pipeline.stage().root().join(OSCARS_KEY)).unwrap();
        assert!(staged.contains("2022,94,CODA,BEST PICTURE,won"));
        assert!(staged.contains("2022,94,Dune,BEST PICTURE,nominated"));
    }
}
