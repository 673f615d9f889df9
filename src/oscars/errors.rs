//! Error types for the awards database scraper.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// A control expected by the search form sequence could not be used.
    #[error("navigation failed at step '{step}' ({locator})")]
    Navigation {
        step: &'static str,
        locator: String,
        #[source]
        source: anyhow::Error,
    },
    /// Results container still missing after the render wait. Logged, never returned.
    #[error("results container not found after {waited:?}")]
    RenderTimeout { waited: Duration },
    #[error("malformed award year title '{title}': {reason}")]
    MalformedGroupTitle { title: String, reason: &'static str },
    /// A category subgroup is missing a nested element. The extractor skips it.
    #[error("malformed award category group ({}): {reason}", .category.as_deref().unwrap_or("<untitled>"))]
    MalformedCategoryGroup {
        category: Option<String>,
        reason: &'static str,
    },
    #[error("browser session failed")]
    Browser(#[source] anyhow::Error),
    /// The scraped page produced no award rows at all, usually a render timeout.
    #[error("results page yielded no award records")]
    NoResults,
}

impl ScrapeError {
    /// Whether a caller may reasonably retry the whole scrape after this error.
    ///
    /// Title parse failures come from the page structure itself and will repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Navigation { .. } | Self::Browser(_) | Self::NoResults
        )
    }
}
