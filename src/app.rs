use std::ops::ControlFlow;

use chrono::Datelike;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::processor::{CsvGenerator, ProgressTracker, Totals};
use crate::scraping::browser::{BrowserController, PageDriver};
use crate::scraping::{login, session, OrderScraper};
use crate::shutdown::ShutdownManager;

pub struct App {
    config: AppConfig,
    years: Vec<i32>,
    progress: ProgressTracker,
    browser: Option<BrowserController>,
    generator: CsvGenerator,
    shutdown: ShutdownManager,
}

impl App {
    pub fn new_with_config(
        config: AppConfig,
        year: Option<i32>,
        shutdown: ShutdownManager,
    ) -> Result<Self, AppError> {
        let current_year = chrono::Local::now().year();
        let years = years_to_scrape(year, current_year, config.scrape.min_year);
        if years.is_empty() {
            return Err(AppError::InvalidArgument(format!(
                "no years between {} and {}",
                config.scrape.min_year, current_year
            )));
        }

        let generator = CsvGenerator::new(&config.output);

        Ok(Self {
            config,
            years,
            progress: ProgressTracker::new(),
            browser: None,
            generator,
            shutdown,
        })
    }

    /// Runs the whole export and returns the grand totals.
    ///
    /// The browser is closed whether or not the export succeeded.
    pub async fn run(&mut self) -> Result<Totals, AppError> {
        let result = match self.initialize_browser().await {
            Ok(()) => self.export().await,
            Err(e) => Err(e),
        };
        self.close_browser().await;

        match &result {
            Ok(_) => self.progress.complete("Export complete"),
            Err(e) => self.progress.abandon(&format!("Export stopped: {}", e)),
        }
        result
    }

    async fn initialize_browser(&mut self) -> Result<(), AppError> {
        self.progress.start("Initializing browser");

        let mut browser = BrowserController::new(&self.config.browser);
        browser.start().await?;
        self.browser = Some(browser);
        Ok(())
    }

    async fn export(&mut self) -> Result<Totals, AppError> {
        let Self {
            config,
            years,
            progress,
            browser,
            generator,
            shutdown,
        } = self;
        let browser = browser
            .as_ref()
            .ok_or_else(|| AppError::BrowserError("Browser not initialized".into()))?;

        run_export(browser, config, years, generator, progress, shutdown).await
    }

    async fn close_browser(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.shutdown().await {
                tracing::warn!("Could not close the browser: {}", e);
            }
        }
    }
}

/// Signs in, exports `years` and then flushes the CSV and saves the cookie
/// jar whether or not the export got through.
///
/// A requested shutdown turns a finished loop into `AppError::Interrupted`.
pub async fn run_export(
    driver: &dyn PageDriver,
    config: &AppConfig,
    years: &[i32],
    generator: &mut CsvGenerator,
    progress: &mut ProgressTracker,
    shutdown: &ShutdownManager,
) -> Result<Totals, AppError> {
    let result = sign_in_and_export(driver, config, years, generator, progress, shutdown).await;

    if let Err(e) = generator.finish() {
        tracing::error!("Could not flush {}: {}", generator.path().display(), e);
    }
    session::save_cookies(driver, &config.session.cookie_file).await;

    match result {
        Ok(totals) if shutdown.is_shutdown() => {
            tracing::info!("Exported before interruption: {}", totals);
            Err(AppError::Interrupted)
        }
        other => other,
    }
}

async fn sign_in_and_export(
    driver: &dyn PageDriver,
    config: &AppConfig,
    years: &[i32],
    generator: &mut CsvGenerator,
    progress: &mut ProgressTracker,
    shutdown: &ShutdownManager,
) -> Result<Totals, AppError> {
    progress.update("Restoring session");
    let restored =
        session::load_cookies(driver, &config.session.cookie_file, &config.site.base_url).await;
    if restored == 0 && config.browser.headless {
        tracing::warn!("No saved session and the browser is headless; manual sign-in will not be possible");
    }

    progress.update("Waiting for sign-in");
    tokio::select! {
        result = login::ensure_signed_in(driver, &config.site, &config.login) => result?,
        _ = shutdown.wait_for_shutdown() => return Err(AppError::Interrupted),
    }

    generator.open()?;
    export_years(driver, config, years, generator, progress, shutdown).await
}

/// Walks `years` newest first. Output failures end the export; anything else
/// only loses the rest of that year.
pub async fn export_years(
    driver: &dyn PageDriver,
    config: &AppConfig,
    years: &[i32],
    generator: &mut CsvGenerator,
    progress: &mut ProgressTracker,
    shutdown: &ShutdownManager,
) -> Result<Totals, AppError> {
    let scraper = OrderScraper::new(driver, &config.site, config.scrape.fetch_details);
    let separator = config.output.decimal_separator();
    let mut grand_total = Totals::default();

    for &year in years {
        if shutdown.is_shutdown() {
            break;
        }
        progress.start_year(year);
        let mut year_total = Totals::default();

        let result = scraper
            .scrape_year(year, |order| {
                if order.shipments.is_empty() {
                    tracing::warn!("Order {} has no line items, skipping", order.id);
                    return Ok(ControlFlow::Continue(()));
                }

                let rows = generator.write_order(&order)?;
                year_total.add_order(&order);
                progress.log_order(&order.id);
                tracing::debug!(
                    "Order {} ({}): {} rows, year so far: {}",
                    order.id,
                    order.display_date(),
                    rows,
                    year_total.display(separator)
                );

                if shutdown.is_shutdown() {
                    Ok(ControlFlow::Break(()))
                } else {
                    Ok(ControlFlow::Continue(()))
                }
            })
            .await;

        match result {
            Ok(summary) => tracing::debug!(
                "Year {}: {} orders on {} pages{}",
                year,
                summary.orders,
                summary.pages,
                if summary.stopped { " (stopped early)" } else { "" }
            ),
            // Output failures would lose data silently; give up.
            Err(e @ (AppError::CsvError(_) | AppError::IoError(_))) => return Err(e),
            Err(e) => tracing::warn!("Year {} incomplete: {}", year, e),
        }

        tracing::info!("{}: {}", year, year_total.display(separator));
        grand_total.merge(&year_total);
        tracing::info!("Running total: {}", grand_total.display(separator));
    }

    Ok(grand_total)
}

/// The requested year, or every year from `current_year` down to `min_year`.
fn years_to_scrape(requested: Option<i32>, current_year: i32, min_year: i32) -> Vec<i32> {
    match requested {
        Some(year) => vec![year],
        None => (min_year..=current_year).rev().collect(),
    }
}
