use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Only export this year (defaults to every year from now back to the configured minimum)
    #[arg(value_name = "YEAR", value_parser = clap::value_parser!(i32).range(1000..=9999))]
    pub year: Option<i32>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output CSV file path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Cookie jar used to reuse the session between runs
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Run browser in headless mode
    #[arg(long)]
    pub headless: bool,

    /// WebDriver endpoint to connect to
    #[arg(long, value_name = "URL")]
    pub webdriver: Option<String>,

    /// How long to wait for the manual sign-in (in seconds)
    #[arg(long, value_name = "SECS")]
    pub login_timeout: Option<u64>,

    /// Take everything from the listing pages instead of opening each order
    #[arg(long)]
    pub listing_only: bool,

    /// Text written into the tags column of every row
    #[arg(long, value_name = "TEXT")]
    pub tag: Option<String>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            year: None,
            config: None,
            output: None,
            cookies: None,
            log_level: "info".to_string(),
            headless: false,
            webdriver: None,
            login_timeout: None,
            listing_only: false,
            tag: None,
        }
    }
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Valid levels are: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.login_timeout == Some(0) {
            return Err("login-timeout must be greater than 0".to_string());
        }

        if let Some(url) = &self.webdriver {
            if url::Url::parse(url).is_err() {
                return Err(format!("Invalid WebDriver URL '{}'", url));
            }
        }

        Ok(())
    }

    pub fn tracing_level(&self) -> tracing::Level {
        match self.log_level.as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }
}
