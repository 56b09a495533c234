use std::time::Duration;

use crate::config::{LoginConfig, SiteConfig};
use crate::error::AppError;
use crate::scraping::browser::PageDriver;

const FAILURE_SCREENSHOT: &str = "login-timeout.png";

pub enum LoginMethod {
    /// The operator types everything into the browser window.
    Manual,
    /// Credentials are typed in for the operator; captchas and 2FA stay manual.
    Assisted {
        email: String,
        password: Option<String>,
    },
}

impl LoginMethod {
    pub fn from_config(config: &LoginConfig) -> Self {
        match &config.email {
            Some(email) => LoginMethod::Assisted {
                email: email.clone(),
                password: config.password.clone(),
            },
            None => LoginMethod::Manual,
        }
    }
}

/// Opens the order history and waits until the session is signed in.
///
/// Restored cookies usually make this return on the first check. Otherwise
/// the operator has `login.timeout` to finish signing in by hand.
pub async fn ensure_signed_in(
    driver: &dyn PageDriver,
    site: &SiteConfig,
    login: &LoginConfig,
) -> Result<(), AppError> {
    driver.goto(&site.order_history_url()).await?;

    if is_signed_in(driver, site).await? {
        tracing::info!("Session is already signed in");
        return Ok(());
    }

    tracing::warn!(
        "Not signed in. Please complete the sign-in in the browser window within {}s",
        login.timeout_secs
    );

    if let LoginMethod::Assisted { email, password } = LoginMethod::from_config(login) {
        if let Err(e) = prefill_credentials(driver, &email, password.as_deref()).await {
            tracing::warn!("Could not pre-fill the sign-in form: {}", e);
        }
    }

    match wait_for_sign_in(driver, site, login.timeout(), login.poll_interval()).await {
        Ok(()) => {
            tracing::info!("Sign-in completed");
            Ok(())
        }
        Err(e) => {
            save_failure_screenshot(driver).await;
            Err(e)
        }
    }
}

/// Polls the current URL until it is an order history page again.
pub(crate) async fn wait_for_sign_in(
    driver: &dyn PageDriver,
    site: &SiteConfig,
    timeout: Duration,
    interval: Duration,
) -> Result<(), AppError> {
    let poll = async {
        loop {
            tokio::time::sleep(interval).await;
            match is_signed_in(driver, site).await {
                Ok(true) => return,
                Ok(false) => {}
                // Navigation in progress; ask again next round.
                Err(e) => tracing::debug!("Sign-in check failed: {}", e),
            }
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| AppError::LoginTimeout(timeout))
}

async fn is_signed_in(driver: &dyn PageDriver, site: &SiteConfig) -> Result<bool, AppError> {
    let current_url = driver.current_url().await?;
    Ok(!current_url.contains(&site.signin_marker) && current_url.contains(&site.order_history_path))
}

async fn prefill_credentials(
    driver: &dyn PageDriver,
    email: &str,
    password: Option<&str>,
) -> Result<(), AppError> {
    if driver.fill("#ap_email", email).await? {
        driver.click("#continue").await?;
    }

    if let Some(password) = password {
        if driver.fill("#ap_password", password).await? {
            driver.click("#signInSubmit").await?;
        }
    }

    Ok(())
}

async fn save_failure_screenshot(driver: &dyn PageDriver) {
    match driver.screenshot().await {
        Ok(png) => match tokio::fs::write(FAILURE_SCREENSHOT, png).await {
            Ok(()) => tracing::info!("Saved screenshot to {}", FAILURE_SCREENSHOT),
            Err(e) => tracing::warn!("Could not write {}: {}", FAILURE_SCREENSHOT, e),
        },
        Err(e) => tracing::warn!("Could not take screenshot: {}", e),
    }
}
