use scraper::{ElementRef, Html};
use url::Url;

use crate::models::Order;
use crate::parsing::{parse_cents, parse_order_date};
use crate::scraping::selectors::{first_href, first_text, listing};
use crate::scraping::shipments::parse_shipments;

/// One page of the year-filtered order history.
#[derive(Debug, Default)]
pub struct ListingPage {
    /// Orders the site reports for the whole year, when it says.
    pub total_orders: Option<u32>,
    pub orders: Vec<Order>,
}

pub fn parse_listing(html: &str, base_url: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let total_orders = first_text(root, &listing::ORDER_COUNT).and_then(|text| {
        text.split_whitespace()
            .find_map(|word| word.replace([',', '.'], "").parse::<u32>().ok())
    });

    let orders = root
        .select(&listing::ORDER_CARD)
        .map(|card| parse_card(card, base_url))
        .collect();

    ListingPage {
        total_orders,
        orders,
    }
}

fn parse_card(card: ElementRef<'_>, base_url: &str) -> Order {
    let details_url = first_href(card, &listing::DETAILS_LINK).and_then(|href| absolute_url(base_url, &href));
    let id = first_text(card, &listing::ORDER_ID)
        .or_else(|| details_url.as_deref().and_then(order_id_from_url))
        .unwrap_or_default();
    let date_text = first_text(card, &listing::ORDER_DATE).unwrap_or_default();

    Order {
        id,
        date: parse_order_date(&date_text),
        date_text,
        details_url,
        total_cents: first_text(card, &listing::ORDER_TOTAL).and_then(|t| parse_cents(&t)),
        shipments: parse_shipments(card),
        ..Order::default()
    }
}

fn absolute_url(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(String::from)
        .ok()
}

/// `orderID` query parameter of a details link.
pub fn order_id_from_url(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case("orderID"))
        .map(|(_, value)| value.into_owned())
}
