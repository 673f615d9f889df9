#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use marquee::oscars::{Browser, Locator};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Scripted stand-in for a WebDriver session. Every call is recorded so tests
/// can assert on the exact sequence the driver performed.
pub struct FakeBrowser {
    pub events: Arc<Mutex<Vec<String>>>,
    /// Locators that fail to click.
    pub missing: HashSet<Locator>,
    /// Answer for any `count` that is not the results container.
    pub option_count: usize,
    pub results_rendered: bool,
    pub fail_open: bool,
    pub fail_close: bool,
    pub markup: String,
}

impl FakeBrowser {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            missing: HashSet::new(),
            option_count: 97,
            results_rendered: true,
            fail_open: false,
            fail_close: false,
            markup: markup.into(),
        }
    }

    pub fn missing(mut self, locator: Locator) -> Self {
        self.missing.insert(locator);
        self
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open(&mut self, url: &str) -> Result<()> {
        self.record(format!("open {url}"));
        if self.fail_open {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        self.record(format!("click {locator}"));
        if self.missing.contains(locator) {
            return Err(anyhow!("no such element: {locator}"));
        }
        Ok(())
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize> {
        self.record(format!("count {locator}"));
        match locator {
            Locator::Id(id) if id == "resultscontainer" => Ok(usize::from(self.results_rendered)),
            _ => Ok(self.option_count),
        }
    }

    async fn page_source(&mut self) -> Result<String> {
        self.record("source".to_string());
        Ok(self.markup.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.record("close".to_string());
        if self.fail_close {
            return Err(anyhow!("session already gone"));
        }
        Ok(())
    }
}

/// A category subgroup. `winner` wraps the first title behind a winner marker.
pub fn category(label: &str, titles: &[&str], winner: bool) -> String {
    let mut html = format!(
        r#"<div class="result-subgroup subgroup-awardcategory-chron">
            <div class="result-subgroup-title"><a href="/">{label}</a></div>"#
    );
    for (i, title) in titles.iter().enumerate() {
        let film = format!(r#"<div class="awards-result-film-title"><a href="/">{title}</a></div>"#);
        if winner && i == 0 {
            html.push_str(r#"<span class="glyphicon glyphicon-star" title="Winner"></span>"#);
            html.push_str(&format!("<div>{film}</div>"));
        } else {
            html.push_str(&format!(r#"<div class="awards-result-nominationstatement">{film}</div>"#));
        }
    }
    html.push_str("</div>");
    html
}

/// A ceremony year group with the given title and category subgroups.
pub fn year_group(title: &str, categories: &[String]) -> String {
    format!(
        r#"<div class="awards-result-chron result-group group-awardcategory-chron">
            <div class="result-group-title"><a href="/">{title}</a></div>
            {}
        </div>"#,
        categories.concat()
    )
}

pub fn results_page(groups: &[String]) -> String {
    format!(
        r#"<html><body><div id="resultscontainer" class="awards-result-set">{}</div></body></html>"#,
        groups.concat()
    )
}
