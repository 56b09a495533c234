use config::{Config, ConfigBuilder, Environment};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::cli::CliArgs;
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub site: SiteConfig,
    #[validate(nested)]
    pub browser: BrowserConfig,
    #[validate(nested)]
    pub login: LoginConfig,
    pub session: SessionConfig,
    #[validate(nested)]
    pub scrape: ScrapeConfig,
    #[validate(nested)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SiteConfig {
    #[validate(url(message = "Base URL must be an absolute URL"))]
    pub base_url: String,
    #[validate(length(min = 1, message = "Order history path cannot be empty"))]
    pub order_history_path: String,
    #[validate(length(min = 1, message = "Order details path cannot be empty"))]
    pub order_details_path: String,
    #[validate(length(min = 1, message = "Sign-in marker cannot be empty"))]
    pub signin_marker: String,
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: u32,
}

impl SiteConfig {
    pub fn order_history_url(&self) -> String {
        join_url(&self.base_url, &self.order_history_path)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BrowserConfig {
    #[validate(url(message = "WebDriver URL must be an absolute URL"))]
    pub webdriver_url: String,
    pub headless: bool,
    #[validate(range(min = 1, message = "Browser timeout must be greater than 0"))]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoginConfig {
    #[validate(range(min = 1, message = "Login timeout must be greater than 0"))]
    pub timeout_secs: u64,
    #[validate(range(min = 10, message = "Poll interval must be at least 10ms"))]
    pub poll_interval_ms: u64,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub cookie_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ScrapeConfig {
    #[validate(range(min = 1995, max = 9999, message = "Minimum year must be a four-digit year"))]
    pub min_year: i32,
    pub fetch_details: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub tag: String,
    #[validate(length(equal = 1, message = "Decimal separator must be a single character"))]
    pub decimal_separator: String,
}

impl OutputConfig {
    pub fn decimal_separator(&self) -> char {
        self.decimal_separator.chars().next().unwrap_or('.')
    }
}

impl AppConfig {
    fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        Config::builder()
            .set_default("site.base_url", "https://www.amazon.com")?
            .set_default("site.order_history_path", "/gp/your-account/order-history")?
            .set_default("site.order_details_path", "/gp/your-account/order-details")?
            .set_default("site.signin_marker", "/ap/")?
            .set_default("site.page_size", 10)?
            .set_default("browser.webdriver_url", "http://localhost:4444")?
            .set_default("browser.headless", false)?
            .set_default("browser.timeout_secs", 30)?
            .set_default("login.timeout_secs", 300)?
            .set_default("login.poll_interval_ms", 2000)?
            .set_default("session.cookie_file", "cookies.json")?
            .set_default("scrape.min_year", 2000)?
            .set_default("scrape.fetch_details", true)?
            .set_default("output.path", "orders.csv")?
            .set_default("output.tag", "")?
            .set_default("output.decimal_separator", ".")
    }

    #[cfg(test)]
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_cli_args(&CliArgs::default())
    }

    pub fn load_with_cli_args(cli_args: &CliArgs) -> Result<Self, AppError> {
        let mut builder = Self::defaults()?
            .add_source(config::File::with_name("config").required(false));

        if let Some(config_path) = &cli_args.config {
            builder = builder.add_source(config::File::from(config_path.clone()));
        }

        builder = builder.add_source(Environment::with_prefix("EXPORTER").prefix_separator("_").separator("__"));

        // Override specific values from CLI args
        if let Some(output_path) = &cli_args.output {
            builder = builder.set_override("output.path", output_path.to_string_lossy().to_string())?;
        }
        if let Some(cookie_path) = &cli_args.cookies {
            builder = builder.set_override("session.cookie_file", cookie_path.to_string_lossy().to_string())?;
        }
        if let Some(url) = &cli_args.webdriver {
            builder = builder.set_override("browser.webdriver_url", url.as_str())?;
        }
        if let Some(secs) = cli_args.login_timeout {
            builder = builder.set_override("login.timeout_secs", secs)?;
        }
        if let Some(tag) = &cli_args.tag {
            builder = builder.set_override("output.tag", tag.as_str())?;
        }
        if cli_args.headless {
            builder = builder.set_override("browser.headless", true)?;
        }
        if cli_args.listing_only {
            builder = builder.set_override("scrape.fetch_details", false)?;
        }

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }
}

/// Joins a site root and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.site.page_size, 10);
        assert_eq!(config.scrape.min_year, 2000);
        assert!(config.scrape.fetch_details);
        assert_eq!(config.output.decimal_separator(), '.');
        assert_eq!(
            config.site.order_history_url(),
            "https://www.amazon.com/gp/your-account/order-history"
        );
    }

    #[test]
    fn cli_overrides_win() {
        let args = CliArgs {
            output: Some(PathBuf::from("out/2020.csv")),
            listing_only: true,
            headless: true,
            login_timeout: Some(42),
            tag: Some("household".to_string()),
            ..CliArgs::default()
        };

        let config = AppConfig::load_with_cli_args(&args).unwrap();
        assert_eq!(config.output.path, PathBuf::from("out/2020.csv"));
        assert!(!config.scrape.fetch_details);
        assert!(config.browser.headless);
        assert_eq!(config.login.timeout(), Duration::from_secs(42));
        assert_eq!(config.output.tag, "household");
    }

    #[test]
    fn rejects_multi_character_separator() {
        let mut config = AppConfig::load().unwrap();
        config.output.decimal_separator = ",,".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("https://a.com/", "/x"), "https://a.com/x");
        assert_eq!(join_url("https://a.com", "x"), "https://a.com/x");
        assert_eq!(join_url("https://a.com", "https://b.com/y"), "https://b.com/y");
    }
}
