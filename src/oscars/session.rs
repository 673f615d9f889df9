//! Drives the awards database search form to the "all years, current
//! categories" results view and returns the rendered markup.
//!
//! The site has no programmatic ready signal, so after submitting the search
//! the driver simply waits a fixed delay before reading the page.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::browser::{Browser, Locator};
use super::errors::ScrapeError;
use super::webdriver::WebDriverBrowser;
use crate::utils::fmt_duration;

pub const DEFAULT_LANDING_URL: &str = "https://awardsdatabase.oscars.org/";

/// Trailing entries of the "years to" dropdown that are not years.
pub const DEFAULT_YEARS_TO_OFFSET: usize = 2;

/// The dropdown currently expanded by a click on one of the multiselect buttons.
const OPEN_DROPDOWN: &str = "//div[@class='btn-group multiselect-btn-group open']";

/// Page structure the driver relies on. Any change on the live site means
/// updating these locators; there is no fallback.
#[derive(Debug, Clone)]
pub struct SearchForm {
    pub landing_url: String,
    pub category_button: Locator,
    pub current_categories: Locator,
    pub years_from_button: Locator,
    pub years_to_button: Locator,
    /// Options of whichever dropdown is currently open.
    pub open_dropdown_items: Locator,
    pub submit_button: Locator,
    pub results_container: Locator,
    /// Option value of the earliest ceremony year.
    pub earliest_year_index: usize,
    pub years_to_offset: usize,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self::new(DEFAULT_LANDING_URL, DEFAULT_YEARS_TO_OFFSET)
    }
}

impl SearchForm {
    pub fn new(landing_url: impl Into<String>, years_to_offset: usize) -> Self {
        Self {
            landing_url: landing_url.into(),
            category_button: Locator::xpath(
                "//button[contains(@class,'awards-basicsrch-awardcategory')]",
            ),
            current_categories: Locator::xpath("//b[contains(text(),'Current Categories')]"),
            years_from_button: Locator::xpath(
                "//button[contains(@class,'awards-advsrch-yearsfrom')]",
            ),
            years_to_button: Locator::xpath("//button[contains(@class,'awards-advsrch-yearsto')]"),
            open_dropdown_items: Locator::xpath(format!("{OPEN_DROPDOWN}//li")),
            submit_button: Locator::xpath("//*[@id=\"btnbasicsearch\"]"),
            results_container: Locator::id("resultscontainer"),
            earliest_year_index: 1,
            years_to_offset,
        }
    }

    /// Option with the given value inside the open dropdown.
    pub fn year_option(&self, index: usize) -> Locator {
        Locator::xpath(format!("{OPEN_DROPDOWN}//input[@value='{index}']"))
    }

    /// Value of the latest year option given how many options the dropdown shows.
    pub fn latest_year_index(&self, option_count: usize) -> Option<usize> {
        option_count
            .checked_sub(self.years_to_offset)
            .filter(|&index| index >= self.earliest_year_index)
    }
}

/// Connect a headless Firefox session and scrape the results page with it.
pub async fn scrape_oscars_page(
    webdriver_url: &str,
    form: &SearchForm,
    delay: Duration,
) -> Result<String, ScrapeError> {
    let browser = WebDriverBrowser::connect(webdriver_url)
        .await
        .map_err(ScrapeError::Browser)?;
    scrape_results_page(browser, form, delay).await
}

/// Run the search sequence on `browser` and return the rendered markup.
///
/// The session is closed before this returns, whatever the outcome. A missing
/// results container after `delay` is only logged; the markup available at
/// that moment is returned and the extractor copes with partial pages.
pub async fn scrape_results_page<B: Browser>(
    mut browser: B,
    form: &SearchForm,
    delay: Duration,
) -> Result<String, ScrapeError> {
    let start = Instant::now();
    let outcome = run_search(&mut browser, form, delay).await;

    match browser.close().await {
        Ok(()) => debug!("Browser session closed"),
        Err(e) => warn!(error = ?e, "Failed to close browser session"),
    }

    match &outcome {
        Ok(markup) => info!(
            bytes = markup.len(),
            duration = fmt_duration(start.elapsed()),
            "Scraped awards database results page"
        ),
        Err(e) => warn!(error = %e, "Awards database scrape failed"),
    }

    outcome
}

async fn run_search<B: Browser>(
    browser: &mut B,
    form: &SearchForm,
    delay: Duration,
) -> Result<String, ScrapeError> {
    browser
        .open(&form.landing_url)
        .await
        .map_err(|source| ScrapeError::Navigation {
            step: "open landing page",
            locator: form.landing_url.clone(),
            source,
        })?;

    click(browser, "open award category selector", &form.category_button).await?;
    click(browser, "choose current categories", &form.current_categories).await?;

    click(browser, "open years-from selector", &form.years_from_button).await?;
    let earliest = form.year_option(form.earliest_year_index);
    click(browser, "choose earliest year", &earliest).await?;

    click(browser, "open years-to selector", &form.years_to_button).await?;
    let option_count = browser
        .count(&form.open_dropdown_items)
        .await
        .map_err(|source| ScrapeError::Navigation {
            step: "count years-to options",
            locator: form.open_dropdown_items.to_string(),
            source,
        })?;
    let latest_index = form
        .latest_year_index(option_count)
        .ok_or_else(|| ScrapeError::Navigation {
            step: "choose latest year",
            locator: form.open_dropdown_items.to_string(),
            source: anyhow::anyhow!(
                "{option_count} options with offset {} leave no selectable year",
                form.years_to_offset
            ),
        })?;
    debug!(option_count, latest_index, "Resolved latest year option");
    let latest = form.year_option(latest_index);
    click(browser, "choose latest year", &latest).await?;

    click(browser, "submit search", &form.submit_button).await?;

    info!(delay = fmt_duration(delay), "Waiting for results to render");
    tokio::time::sleep(delay).await;

    match browser.count(&form.results_container).await {
        Ok(n) if n > 0 => debug!("Results container present"),
        Ok(_) => warn!(
            error = %ScrapeError::RenderTimeout { waited: delay },
            "Needed element still not found, returning page as-is"
        ),
        Err(e) => warn!(
            error = %ScrapeError::RenderTimeout { waited: delay },
            cause = ?e,
            "Could not query results container, returning page as-is"
        ),
    }

    browser.page_source().await.map_err(ScrapeError::Browser)
}

async fn click<B: Browser>(
    browser: &mut B,
    step: &'static str,
    locator: &Locator,
) -> Result<(), ScrapeError> {
    debug!(step, %locator, "Clicking");
    browser
        .click(locator)
        .await
        .map_err(|source| ScrapeError::Navigation {
            step,
            locator: locator.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_year_index_skips_trailing_entries() {
        let form = SearchForm::default();
        assert_eq!(form.latest_year_index(97), Some(95));
    }

    #[test]
    fn test_latest_year_index_custom_offset() {
        let form = SearchForm::new(DEFAULT_LANDING_URL, 0);
        assert_eq!(form.latest_year_index(10), Some(10));
    }

    #[test]
    fn test_latest_year_index_too_few_options() {
        let form = SearchForm::default();
        assert_eq!(form.latest_year_index(0), None);
        assert_eq!(form.latest_year_index(2), None);
        // Only the earliest index itself is left: still selectable
        assert_eq!(form.latest_year_index(3), Some(1));
    }

    #[test]
    fn test_year_option_targets_open_dropdown() {
        let form = SearchForm::default();
        assert_eq!(
            form.year_option(1),
            Locator::xpath("//div[@class='btn-group multiselect-btn-group open']//input[@value='1']")
        );
    }
}
