use async_trait::async_trait;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;

use crate::config::BrowserConfig;
use crate::error::AppError;
use crate::scraping::session::StoredCookie;

/// The browser operations the scraper needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), AppError>;

    async fn current_url(&self) -> Result<String, AppError>;

    /// Full HTML of the current page.
    async fn source(&self) -> Result<String, AppError>;

    /// Types into the first element matching `selector`. `Ok(false)` when nothing matched.
    async fn fill(&self, selector: &str, value: &str) -> Result<bool, AppError>;

    /// Clicks the first element matching `selector`. `Ok(false)` when nothing matched.
    async fn click(&self, selector: &str) -> Result<bool, AppError>;

    async fn cookies(&self) -> Result<Vec<StoredCookie>, AppError>;

    async fn add_cookie(&self, cookie: StoredCookie) -> Result<(), AppError>;

    async fn screenshot(&self) -> Result<Vec<u8>, AppError>;
}

pub struct BrowserController {
    client: Option<Client>,
    webdriver_url: String,
    headless: bool,
    timeout: Duration,
}

impl BrowserController {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            client: None,
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub async fn start(&mut self) -> Result<(), AppError> {
        let mut builder = ClientBuilder::native();
        if self.headless {
            // Each driver ignores the other vendor's options.
            let caps = json!({
                "goog:chromeOptions": { "args": ["--headless=new", "--window-size=1280,1024"] },
                "moz:firefoxOptions": { "args": ["-headless"] },
            });
            if let serde_json::Value::Object(caps) = caps {
                builder.capabilities(caps);
            }
        }

        tracing::info!("Connecting to WebDriver at {}", self.webdriver_url);
        let client = builder.connect(&self.webdriver_url).await?;
        client
            .update_timeouts(TimeoutConfiguration::new(
                Some(self.timeout),
                Some(self.timeout),
                None,
            ))
            .await?;

        self.client = Some(client);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        if let Some(client) = self.client.take() {
            tracing::debug!("Closing WebDriver session");
            client.close().await?;
        }
        Ok(())
    }

    fn client(&self) -> Result<&Client, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::BrowserError("Browser not initialized".into()))
    }
}

#[async_trait]
impl PageDriver for BrowserController {
    async fn goto(&self, url: &str) -> Result<(), AppError> {
        tracing::debug!("Navigating to {}", url);
        self.client()?.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, AppError> {
        Ok(self.client()?.current_url().await?.to_string())
    }

    async fn source(&self) -> Result<String, AppError> {
        Ok(self.client()?.source().await?)
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<bool, AppError> {
        match self.client()?.find(Locator::Css(selector)).await {
            Ok(element) => {
                element.clear().await?;
                element.send_keys(value).await?;
                Ok(true)
            }
            Err(e) if e.is_no_such_element() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn click(&self, selector: &str) -> Result<bool, AppError> {
        match self.client()?.find(Locator::Css(selector)).await {
            Ok(element) => {
                element.click().await?;
                Ok(true)
            }
            Err(e) if e.is_no_such_element() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>, AppError> {
        let cookies = self.client()?.get_all_cookies().await?;
        Ok(cookies.iter().map(StoredCookie::from).collect())
    }

    async fn add_cookie(&self, cookie: StoredCookie) -> Result<(), AppError> {
        self.client()?.add_cookie(cookie.into_cookie()).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AppError> {
        Ok(self.client()?.screenshot().await?)
    }
}
