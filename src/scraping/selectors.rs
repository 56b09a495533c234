//! CSS selectors for the order history and order details pages.
//!
//! The site changes its markup regularly. Each field lists the selector
//! alternatives seen so far; the first match in document order wins. When a
//! field stops being found, capture the page HTML, add the new selector here
//! and add a fixture to the parser tests.

use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use crate::parsing::collapse_whitespace;

/// Selectors for the year-filtered order history listing.
pub mod listing {
    use super::*;

    /// "42 orders placed in 2021".
    pub static ORDER_COUNT: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".num-orders, \
             .num-orders-for-orders-by-date",
        )
        .unwrap()
    });

    /// One card per order.
    pub static ORDER_CARD: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".js-order-card, \
             .order-card",
        )
        .unwrap()
    });

    pub static ORDER_ID: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".yohtmlc-order-id bdi, \
             .yohtmlc-order-id .value, \
             .order-header__header-list-item bdi",
        )
        .unwrap()
    });

    pub static ORDER_DATE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".order-date .value, \
             .order-info .a-col-left .a-column:first-child .value, \
             .order-header .a-column:first-child .a-size-base",
        )
        .unwrap()
    });

    pub static ORDER_TOTAL: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".yohtmlc-order-total .value, \
             .order-total .value",
        )
        .unwrap()
    });

    pub static DETAILS_LINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a.yohtmlc-order-details-link, \
             a[href*='order-details']",
        )
        .unwrap()
    });
}

/// Selectors for the single order details page.
pub mod details {
    use super::*;

    pub static ORDER_DATE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".order-date-invoice-item, \
             [data-component='orderDate']",
        )
        .unwrap()
    });

    /// One row per charge in the order summary box.
    pub static SUMMARY_ROW: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "#od-subtotals .a-row, \
             [data-component='chargeSummary'] .od-line-item-row",
        )
        .unwrap()
    });

    pub static SUMMARY_LABEL: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".a-column.a-span7, \
             .od-line-item-row-label",
        )
        .unwrap()
    });

    pub static SUMMARY_VALUE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".a-column.a-span5, \
             .od-line-item-row-content",
        )
        .unwrap()
    });
}

/// Shipment and item selectors shared by both pages.
pub mod shipment {
    use super::*;

    pub static SHIPMENT: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".shipment, \
             .delivery-box",
        )
        .unwrap()
    });

    pub static STATUS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".shipment-top-row .a-size-medium, \
             .js-shipment-info-container .a-size-medium, \
             .delivery-box__primary-text",
        )
        .unwrap()
    });

    pub static ITEM: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".yohtmlc-item, \
             .item-box",
        )
        .unwrap()
    });

    pub static ITEM_NAME: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".yohtmlc-product-title, \
             a.a-link-normal",
        )
        .unwrap()
    });

    pub static ITEM_PRICE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".a-color-price, \
             .yohtmlc-item-price",
        )
        .unwrap()
    });

    pub static ITEM_QUANTITY: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".item-view-qty, \
             .product-image__qty",
        )
        .unwrap()
    });
}

/// Whitespace-collapsed text of an element.
pub fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of the first descendant matching `selector`, if it has any.
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(text_of)
        .find(|text| !text.is_empty())
}

/// `href` of the first descendant matching `selector`.
pub fn first_href(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .find_map(|el| el.value().attr("href"))
        .map(str::to_string)
}
