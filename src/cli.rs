use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::parse_duration;

/// Movie metadata extract & stage pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log formatter to use
    #[arg(long, value_enum, default_value_t = default_tracing_format(), global = true)]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingFormat {
    /// Compact human-readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Scrape the Academy Awards database and stage the award results
    Oscars {
        /// Wait after submitting the search (e.g. "90s"); overrides RENDER_DELAY
        #[arg(long, value_parser = parse_duration)]
        delay: Option<Duration>,
    },
    /// Fetch Bechdel test scores and stage them
    Bechdel,
    /// Download IMDB datasets and stage them in chunks
    Imdb {
        /// Rows per staged part file; overrides IMDB_CHUNK_SIZE
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Dataset file to ingest (repeatable); overrides IMDB_DATASETS
        #[arg(long = "dataset")]
        datasets: Vec<String>,
    },
    /// Run the Oscars, Bechdel and IMDB flows in order
    All,
    /// Stage previously saved Oscars/Bechdel CSVs from a directory, then run IMDB
    Seed {
        /// Directory holding oscars_awards.csv and bechdel_test_movies.csv
        dir: PathBuf,
    },
    /// Extract award rows from a saved results page
    Extract {
        /// HTML file saved from the awards database results view
        input: PathBuf,
        /// Print CSV to stdout instead of staging it
        #[arg(long)]
        stdout: bool,
    },
}

fn default_tracing_format() -> TracingFormat {
    if cfg!(debug_assertions) {
        TracingFormat::Pretty
    } else {
        TracingFormat::Json
    }
}
