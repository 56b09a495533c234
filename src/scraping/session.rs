//! Cookie jar persisted between runs so a signed-in session can be reused.

use cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::scraping::browser::PageDriver;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    /// Unix timestamp; session cookies have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

impl StoredCookie {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    pub fn into_cookie(self) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name, self.value))
            .secure(self.secure)
            .http_only(self.http_only);
        if let Some(domain) = self.domain {
            builder = builder.domain(domain);
        }
        if let Some(path) = self.path {
            builder = builder.path(path);
        }
        match self.same_site.as_deref() {
            Some("Strict") => builder = builder.same_site(SameSite::Strict),
            Some("Lax") => builder = builder.same_site(SameSite::Lax),
            Some("None") => builder = builder.same_site(SameSite::None),
            _ => {}
        }
        if let Some(expires) = self
            .expires
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
        {
            builder = builder.expires(expires);
        }
        builder.build()
    }
}

impl From<&Cookie<'_>> for StoredCookie {
    fn from(cookie: &Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            secure: cookie.secure().unwrap_or(false),
            http_only: cookie.http_only().unwrap_or(false),
            same_site: cookie.same_site().map(|s| s.to_string()),
            expires: cookie.expires_datetime().map(|dt| dt.unix_timestamp()),
        }
    }
}

/// Restores cookies from `path` into the browser. Failures are logged and
/// treated as an empty jar.
///
/// WebDriver only accepts cookies for the current domain, so the browser is
/// pointed at `site_root` first.
pub async fn load_cookies(driver: &dyn PageDriver, path: &Path, site_root: &str) -> usize {
    match try_load_cookies(driver, path, site_root).await {
        Ok(count) => {
            tracing::info!("Restored {} cookies from {}", count, path.display());
            count
        }
        Err(e) => {
            tracing::warn!("Could not restore cookies from {}: {}", path.display(), e);
            0
        }
    }
}

async fn try_load_cookies(
    driver: &dyn PageDriver,
    path: &Path,
    site_root: &str,
) -> Result<usize, AppError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let cookies: Vec<StoredCookie> = serde_json::from_str(&raw)?;
    let now = chrono::Utc::now().timestamp();

    driver.goto(site_root).await?;

    let mut restored = 0;
    for cookie in cookies.into_iter().filter(|c| !c.is_expired(now)) {
        let name = cookie.name.clone();
        match driver.add_cookie(cookie).await {
            Ok(()) => restored += 1,
            Err(e) => tracing::debug!("Skipping cookie {}: {}", name, e),
        }
    }
    Ok(restored)
}

/// Writes the browser's current cookies to `path`. Failures are logged only.
pub async fn save_cookies(driver: &dyn PageDriver, path: &Path) -> usize {
    match try_save_cookies(driver, path).await {
        Ok(count) => {
            tracing::info!("Saved {} cookies to {}", count, path.display());
            count
        }
        Err(e) => {
            tracing::warn!("Could not save cookies to {}: {}", path.display(), e);
            0
        }
    }
}

async fn try_save_cookies(driver: &dyn PageDriver, path: &Path) -> Result<usize, AppError> {
    let cookies = driver.cookies().await?;
    let json = serde_json::to_string_pretty(&cookies)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await?;
    Ok(cookies.len())
}
