//! Narrow browser-automation interface used by the session driver.
//!
//! The driver only needs to open a page, click things, count matches, read
//! the rendered markup, and close the session. Any automation backend that
//! can do those five things can stand in for the WebDriver implementation.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// How a page element is located.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Id(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath(expr) => write!(f, "xpath {expr}"),
            Self::Id(id) => write!(f, "id #{id}"),
        }
    }
}

#[async_trait]
pub trait Browser: Send {
    /// Navigate the session to `url`.
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Click the first element matching `locator`. Errors when nothing matches.
    async fn click(&mut self, locator: &Locator) -> Result<()>;

    /// Number of elements currently matching `locator`.
    async fn count(&mut self, locator: &Locator) -> Result<usize>;

    /// Markup of the page as currently rendered.
    async fn page_source(&mut self) -> Result<String>;

    /// Tear down the session. Called exactly once by the driver.
    async fn close(&mut self) -> Result<()>;
}
