//! Academy Awards database scraper: a session driver that walks the search
//! form in a browser, and a pure extractor that turns the rendered results
//! page into award rows.

pub mod browser;
pub mod errors;
pub mod extract;
pub mod models;
pub mod session;
pub mod webdriver;

pub use browser::{Browser, Locator};
pub use errors::ScrapeError;
pub use extract::extract_award_records;
pub use models::{AwardRecord, AwardStatus};
pub use session::{SearchForm, scrape_oscars_page, scrape_results_page};
