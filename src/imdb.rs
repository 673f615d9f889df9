//! IMDB bulk dataset ingestion.
//!
//! The datasets at <https://datasets.imdbws.com/> are gzip-compressed TSV files
//! of several gigabytes once decoded. Each is downloaded to a temporary file
//! under `imdb/raw/` in the staging area, then read back in fixed-size row
//! chunks; every chunk is cleaned up and staged as its own part file so the
//! warehouse can load them incrementally. The raw download is removed once
//! chunked, or as soon as the download fails.

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use futures::StreamExt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::stage::StagingArea;
use crate::utils::{fmt_duration, log_if_slow};

pub const DEFAULT_BASE_URL: &str = "https://datasets.imdbws.com/";

pub const DEFAULT_DATASETS: [&str; 4] = [
    "title.basics.tsv.gz",
    "title.principals.tsv.gz",
    "title.crew.tsv.gz",
    "title.ratings.tsv.gz",
];

/// Columns coerced to numbers; any of them may be absent from a dataset.
const NUMERIC_COLUMNS: [&str; 4] = ["isAdult", "endYear", "startYear", "runtimeMinutes"];

/// Table name for a dataset file: `title.basics.tsv.gz` -> `title_basics`.
pub fn table_name(dataset: &str) -> String {
    dataset.trim_end_matches(".tsv.gz").replace('.', "_")
}

/// Staging key of the `part`-th (1-based) chunk of a table.
pub fn part_key(table: &str, part: usize) -> String {
    format!("imdb/{table}/{table}_part{part:02}.tsv")
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkOptions {
    pub chunk_size: usize,
    /// Pause between staging consecutive chunks.
    pub chunk_delay: Duration,
}

/// A header row plus up to `chunk_size` data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ImdbChunk {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ImdbChunk {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Normalize a chunk in place.
///
/// `tconst` loses its `tt` prefix and becomes a plain integer. The numeric
/// columns are coerced: anything that does not parse (IMDB writes `\N` for
/// missing values) becomes an empty cell.
pub fn transform_chunk(chunk: &mut ImdbChunk) -> Result<()> {
    if let Some(idx) = chunk.column("tconst") {
        for (line, row) in chunk.rows.iter_mut().enumerate() {
            let Some(cell) = row.get_mut(idx) else {
                continue;
            };
            let id: u64 = cell
                .strip_prefix("tt")
                .unwrap_or(cell.as_str())
                .parse()
                .with_context(|| format!("Invalid tconst '{cell}' in chunk row {}", line + 1))?;
            *cell = id.to_string();
        }
    }

    let numeric: Vec<usize> = NUMERIC_COLUMNS
        .iter()
        .filter_map(|name| chunk.column(name))
        .collect();
    for row in &mut chunk.rows {
        for &idx in &numeric {
            if let Some(cell) = row.get_mut(idx) {
                *cell = coerce_numeric(cell);
            }
        }
    }

    Ok(())
}

fn coerce_numeric(cell: &str) -> String {
    let cell = cell.trim();
    match cell.parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => match cell.parse::<f64>() {
            Ok(f) if f.is_finite() => f.to_string(),
            _ => String::new(),
        },
    }
}

/// Reads a TSV stream `chunk_size` rows at a time.
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    chunk_size: usize,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(source: R, chunk_size: usize) -> Result<Self> {
        anyhow::ensure!(chunk_size > 0, "chunk size must be positive");

        // IMDB does not quote fields; titles contain stray quote characters
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .from_reader(source);
        let headers = reader
            .headers()
            .context("Failed to read TSV header")?
            .iter()
            .map(str::to_string)
            .collect();

        Ok(Self {
            reader,
            headers,
            chunk_size,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The next chunk, or `None` once the stream is drained.
    pub fn next_chunk(&mut self) -> Result<Option<ImdbChunk>> {
        let mut rows = Vec::with_capacity(self.chunk_size.min(65_536));
        let mut record = csv::StringRecord::new();

        while rows.len() < self.chunk_size && self.reader.read_record(&mut record)? {
            rows.push(record.iter().map(str::to_string).collect());
        }

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(ImdbChunk {
            headers: self.headers.clone(),
            rows,
        }))
    }
}

/// Chunk reader over a gzip-compressed TSV file.
pub fn open_gzip(
    path: &Path,
    chunk_size: usize,
) -> Result<ChunkReader<MultiGzDecoder<BufReader<File>>>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    ChunkReader::new(MultiGzDecoder::new(BufReader::new(file)), chunk_size)
}

/// Transform and stage every chunk of `source` as `imdb/<table>/<table>_partNN.tsv`.
///
/// Blocking; returns the number of parts written.
pub fn stage_chunks<R: Read>(
    stage: &StagingArea,
    mut reader: ChunkReader<R>,
    table: &str,
    chunk_delay: Duration,
) -> Result<usize> {
    let mut part = 0;

    while let Some(mut chunk) = reader.next_chunk()? {
        if part > 0 && !chunk_delay.is_zero() {
            std::thread::sleep(chunk_delay);
        }
        part += 1;

        transform_chunk(&mut chunk)
            .with_context(|| format!("Failed to transform {table} part {part}"))?;
        stage.put_table(&part_key(table, part), &chunk.headers, &chunk.rows, b'\t')?;

        info!(table, part, rows = chunk.rows.len(), "Staged IMDB chunk");
    }

    Ok(part)
}

/// Downloads dataset files from the IMDB dataset host.
pub struct ImdbClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ImdbClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).context("Invalid IMDB base URL")?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .context("Failed to build reqwest client")?,
            base_url,
        })
    }

    pub fn dataset_url(&self, dataset: &str) -> Result<Url> {
        self.base_url
            .join(dataset)
            .with_context(|| format!("Invalid dataset name '{dataset}'"))
    }

    /// Stream `dataset` to `dest`, returning the number of bytes written.
    pub async fn download(&self, dataset: &str, dest: &Path) -> Result<u64> {
        let url = self.dataset_url(dataset)?;
        let start = Instant::now();

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to GET {url}"))?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        let mut body = resp.bytes_stream();
        let mut written = 0u64;

        while let Some(bytes) = body.next().await {
            let bytes = bytes.with_context(|| format!("Download of {url} interrupted"))?;
            file.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }
        file.flush().await?;

        info!(
            dataset,
            bytes = written,
            duration = fmt_duration(start.elapsed()),
            "Downloaded IMDB dataset"
        );
        Ok(written)
    }
}

/// Download one dataset into the staging area and stage it in chunks.
pub async fn ingest_dataset(
    client: &ImdbClient,
    stage: &StagingArea,
    dataset: &str,
    options: ChunkOptions,
) -> Result<usize> {
    anyhow::ensure!(options.chunk_size > 0, "chunk size must be positive");

    let raw_key = format!("imdb/raw/{dataset}");
    let raw_dir = stage
        .prepare(&raw_key)?
        .parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("No parent directory for {raw_key}"))?;
    let raw = tempfile::Builder::new()
        .prefix(&format!("{dataset}."))
        .suffix(".part")
        .tempfile_in(&raw_dir)
        .with_context(|| format!("Failed to create download file in {}", raw_dir.display()))?
        .into_temp_path();

    // Dropping `raw` on an early return removes the partial download
    client.download(dataset, &raw).await?;

    let table = table_name(dataset);
    let stage = stage.clone();
    tokio::task::spawn_blocking(move || stage_raw_file(&stage, raw, &table, options))
        .await
        .context("IMDB chunking task panicked")?
}

/// Chunk and stage a downloaded gzip TSV, then delete it.
pub fn stage_raw_file(
    stage: &StagingArea,
    raw: TempPath,
    table: &str,
    options: ChunkOptions,
) -> Result<usize> {
    let start = Instant::now();
    let reader = open_gzip(&raw, options.chunk_size)?;
    debug!(
        table,
        columns = reader.headers().len(),
        "Reading IMDB dataset"
    );
    let parts = stage_chunks(stage, reader, table, options.chunk_delay)?;

    raw.close()
        .with_context(|| format!("Failed to remove raw download for {table}"))?;
    log_if_slow(start, Duration::from_secs(15 * 60), "IMDB dataset chunking");
    Ok(parts)
}
