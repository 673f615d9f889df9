//! Local staging area laid out like the warehouse's landing bucket.
//!
//! Every table is written under a relative key such as
//! `oscars/oscars_awards.csv`; the warehouse loader picks files up from there.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const OSCARS_KEY: &str = "oscars/oscars_awards.csv";
pub const BECHDEL_KEY: &str = "bechdel/bechdel_test_movies.csv";

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of `key`, creating its parent directories.
    ///
    /// Keys must be relative and stay inside the staging root.
    pub fn prepare(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || !is_plain {
            anyhow::bail!("Invalid staging key '{key}'");
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(path)
    }

    /// Serialize `rows` as CSV with a header row. Returns the number of rows written.
    ///
    /// An empty `rows` is an error and leaves any table already at `key` untouched.
    pub fn put_csv<T: Serialize>(&self, key: &str, rows: &[T]) -> Result<usize> {
        if rows.is_empty() {
            anyhow::bail!("Refusing to stage empty table at '{key}'");
        }
        let path = self.prepare(key)?;
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        debug!(key, rows = rows.len(), "Staged table");
        Ok(rows.len())
    }

    /// Write an untyped table of string cells with the given delimiter.
    pub fn put_table(
        &self,
        key: &str,
        headers: &[String],
        rows: &[Vec<String>],
        delimiter: u8,
    ) -> Result<usize> {
        let path = self.prepare(key)?;
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(file);

        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        debug!(key, rows = rows.len(), "Staged table");
        Ok(rows.len())
    }

    /// Copy an existing file into the staging area under `key`.
    pub fn put_file(&self, source: &Path, key: &str) -> Result<u64> {
        let path = self.prepare(key)?;
        let bytes = fs::copy(source, &path).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), path.display())
        })?;

        debug!(key, bytes, "Staged file");
        Ok(bytes)
    }
}
