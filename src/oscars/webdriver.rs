//! [`Browser`] backed by a W3C WebDriver server (geckodriver + headless Firefox).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use thirtyfour::CapabilitiesHelper;
use thirtyfour::prelude::*;
use tracing::debug;

use super::browser::{Browser, Locator};

pub struct WebDriverBrowser {
    driver: Option<WebDriver>,
}

impl WebDriverBrowser {
    /// Start a headless Firefox session on the WebDriver server at `server_url`.
    pub async fn connect(server_url: &str) -> Result<Self> {
        let mut caps = DesiredCapabilities::firefox();
        caps.set_headless()?;
        caps.accept_ssl_certs(true)?;

        let driver = WebDriver::new(server_url, caps)
            .await
            .with_context(|| format!("Failed to connect to WebDriver at {server_url}"))?;

        debug!(server_url, "WebDriver session started");
        Ok(Self {
            driver: Some(driver),
        })
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| anyhow!("browser session already closed"))
    }
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::XPath(expr) => By::XPath(expr.as_str()),
        Locator::Id(id) => By::Id(id.as_str()),
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&mut self, url: &str) -> Result<()> {
        self.driver()?.goto(url).await?;
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        let element = self.driver()?.find(by(locator)).await?;
        element.click().await?;
        Ok(())
    }

    async fn count(&mut self, locator: &Locator) -> Result<usize> {
        Ok(self.driver()?.find_all(by(locator)).await?.len())
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.driver()?.source().await?)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
        }
        Ok(())
    }
}
