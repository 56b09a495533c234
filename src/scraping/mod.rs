pub mod browser;
pub mod details;
pub mod listing;
pub mod login;
pub mod selectors;
pub mod session;
mod shipments;

#[cfg(test)]
mod tests;

use std::ops::ControlFlow;
use url::Url;

use crate::config::{join_url, SiteConfig};
use crate::error::AppError;
use crate::models::Order;
use browser::PageDriver;
use details::{parse_order_details, OrderDetails};
use listing::{parse_listing, ListingPage};

/// What came out of walking one year of listings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct YearSummary {
    pub orders: u32,
    pub pages: u32,
    /// The visitor asked to stop before the year was done.
    pub stopped: bool,
}

pub struct OrderScraper<'a> {
    driver: &'a dyn PageDriver,
    site: &'a SiteConfig,
    fetch_details: bool,
}

impl<'a> OrderScraper<'a> {
    pub fn new(driver: &'a dyn PageDriver, site: &'a SiteConfig, fetch_details: bool) -> Self {
        Self {
            driver,
            site,
            fetch_details,
        }
    }

    pub fn listing_url(&self, year: i32, start_index: u32) -> Result<String, AppError> {
        let mut url = Url::parse(&self.site.order_history_url())
            .map_err(|e| AppError::InvalidArgument(format!("order history URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("orderFilter", &format!("year-{}", year))
            .append_pair("startIndex", &start_index.to_string());
        Ok(url.into())
    }

    /// Details page address for an order id, for cards that carry no link.
    pub fn details_url(&self, order_id: &str) -> Option<String> {
        if order_id.is_empty() {
            return None;
        }
        let mut url = Url::parse(&join_url(&self.site.base_url, &self.site.order_details_path)).ok()?;
        url.query_pairs_mut().append_pair("orderID", order_id);
        Some(url.into())
    }

    pub async fn fetch_listing(&self, year: i32, start_index: u32) -> Result<ListingPage, AppError> {
        let url = self.listing_url(year, start_index)?;
        self.driver.goto(&url).await?;
        let html = self.driver.source().await?;
        Ok(parse_listing(&html, &self.site.base_url))
    }

    pub async fn fetch_details(&self, details_url: &str) -> Result<OrderDetails, AppError> {
        self.driver.goto(details_url).await?;
        let html = self.driver.source().await?;
        Ok(parse_order_details(&html))
    }

    /// Fills `order` from its details page. Listing data is kept when that fails.
    pub async fn enrich_order(&self, order: &mut Order) {
        if !self.fetch_details {
            return;
        }
        let Some(url) = order.details_url.clone().or_else(|| self.details_url(&order.id)) else {
            tracing::debug!("Order {} has no details link", order.id);
            return;
        };

        match self.fetch_details(&url).await {
            Ok(details) => details.apply_to(order),
            Err(e) => tracing::warn!(
                "Could not load details for order {}, keeping listing data: {}",
                order.id,
                e
            ),
        }
    }

    /// Walks every listing page of `year`, handing each finished order to `visit`.
    pub async fn scrape_year<F>(&self, year: i32, mut visit: F) -> Result<YearSummary, AppError>
    where
        F: FnMut(Order) -> Result<ControlFlow<()>, AppError>,
    {
        let page_size = self.site.page_size;
        let mut summary = YearSummary::default();
        let mut start_index = 0;
        let mut previous_first_id: Option<String> = None;

        loop {
            let page = self.fetch_listing(year, start_index).await?;
            summary.pages += 1;

            let Some(first) = page.orders.first() else {
                break;
            };
            // Some listings ignore startIndex and keep serving the first page.
            if !first.id.is_empty() && previous_first_id.as_deref() == Some(first.id.as_str()) {
                tracing::warn!("Listing for {} repeated page at index {}, stopping", year, start_index);
                break;
            }
            previous_first_id = Some(first.id.clone());

            let on_page = page.orders.len() as u32;
            tracing::debug!(
                "Year {}: {} orders on page {} (total {:?})",
                year,
                on_page,
                summary.pages,
                page.total_orders
            );

            for mut order in page.orders {
                self.enrich_order(&mut order).await;
                summary.orders += 1;
                if visit(order)?.is_break() {
                    summary.stopped = true;
                    return Ok(summary);
                }
            }

            start_index += page_size;
            let done = match page.total_orders {
                Some(total) => start_index >= total,
                None => on_page < page_size,
            };
            if done {
                break;
            }
        }

        Ok(summary)
    }
}
