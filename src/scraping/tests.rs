use super::*;
use crate::config::LoginConfig;
use browser::MockPageDriver;
use login::{ensure_signed_in, wait_for_sign_in};
use mockall::predicate::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn site() -> SiteConfig {
    SiteConfig {
        base_url: "https://shop.test".to_string(),
        order_history_path: "/gp/your-account/order-history".to_string(),
        order_details_path: "/gp/your-account/order-details".to_string(),
        signin_marker: "/ap/".to_string(),
        page_size: 2,
    }
}

fn login_config(email: Option<&str>) -> LoginConfig {
    LoginConfig {
        timeout_secs: 1,
        poll_interval_ms: 10,
        email: email.map(str::to_string),
        password: email.map(|_| "hunter2".to_string()),
    }
}

fn card(id: &str, item: &str, price: &str) -> String {
    format!(
        r#"<div class="js-order-card">
             <div class="order-date"><span class="value">June 1, 2020</span></div>
             <div class="yohtmlc-order-id"><bdi>{id}</bdi></div>
             <a class="yohtmlc-order-details-link" href="/gp/your-account/order-details?orderID={id}">Details</a>
             <div class="shipment"><div class="yohtmlc-item">
               <a class="a-link-normal">{item}</a><span class="a-color-price">{price}</span>
             </div></div>
           </div>"#
    )
}

fn listing_page(total: u32, cards: &[String]) -> String {
    format!(
        r#"<html><body><span class="num-orders">{total} orders</span>{}</body></html>"#,
        cards.join("")
    )
}

/// A mock browser that serves `pages` by URL and remembers every visited URL.
fn serving(pages: Vec<(String, String)>) -> (MockPageDriver, Arc<Mutex<Vec<String>>>) {
    let visited = Arc::new(Mutex::new(Vec::new()));
    let mut mock = MockPageDriver::new();

    let log = visited.clone();
    mock.expect_goto().returning(move |url| {
        log.lock().unwrap().push(url.to_string());
        Ok(())
    });

    let log = visited.clone();
    mock.expect_source().returning(move || {
        let current = log.lock().unwrap().last().cloned().unwrap_or_default();
        Ok(pages
            .iter()
            .find(|(url, _)| *url == current)
            .map(|(_, html)| html.clone())
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    });

    (mock, visited)
}

#[test]
fn builds_year_filtered_listing_url() {
    let site = site();
    let mock = MockPageDriver::new();
    let scraper = OrderScraper::new(&mock, &site, false);

    assert_eq!(
        scraper.listing_url(2019, 20).unwrap(),
        "https://shop.test/gp/your-account/order-history?orderFilter=year-2019&startIndex=20"
    );
}

#[test]
fn builds_details_url_from_order_id() {
    let site = site();
    let mock = MockPageDriver::new();
    let scraper = OrderScraper::new(&mock, &site, true);

    assert_eq!(
        scraper.details_url("111-22").as_deref(),
        Some("https://shop.test/gp/your-account/order-details?orderID=111-22")
    );
    assert_eq!(scraper.details_url(""), None);
}

#[tokio::test]
async fn pages_until_advertised_total() {
    let site = site();
    let idle = MockPageDriver::new();
    let urls = OrderScraper::new(&idle, &site, false);
    let page0 = urls.listing_url(2020, 0).unwrap();
    let page1 = urls.listing_url(2020, 2).unwrap();

    let (mock, visited) = serving(vec![
        (page0, listing_page(3, &[card("A", "Widget", "$1.00"), card("B", "Gadget", "$2.00")])),
        (page1, listing_page(3, &[card("C", "Cable", "$3.00")])),
    ]);
    let scraper = OrderScraper::new(&mock, &site, false);

    let mut ids = Vec::new();
    let summary = scraper
        .scrape_year(2020, |order| {
            ids.push(order.id);
            Ok(ControlFlow::Continue(()))
        })
        .await
        .unwrap();

    assert_eq!(ids, vec!["A", "B", "C"]);
    assert_eq!(summary, YearSummary { orders: 3, pages: 2, stopped: false });
    // Listing-only mode never opens details pages.
    assert_eq!(visited.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn stops_on_empty_page() {
    let site = site();
    let idle = MockPageDriver::new();
    let urls = OrderScraper::new(&idle, &site, false);
    let page0 = urls.listing_url(2018, 0).unwrap();

    // No order count on the page, and a full page of orders.
    let html = format!(
        "<html><body>{}{}</body></html>",
        card("A", "Widget", "$1.00"),
        card("B", "Gadget", "$2.00")
    );
    let (mock, _) = serving(vec![(page0, html)]);
    let scraper = OrderScraper::new(&mock, &site, false);

    let summary = scraper
        .scrape_year(2018, |_| Ok(ControlFlow::Continue(())))
        .await
        .unwrap();

    assert_eq!(summary.orders, 2);
    assert_eq!(summary.pages, 2);
}

#[tokio::test]
async fn repeated_page_ends_the_year() {
    let site = site();
    let mut mock = MockPageDriver::new();
    mock.expect_goto().returning(|_| Ok(()));
    mock.expect_source()
        .returning(|| Ok(format!("<html><body>{}{}</body></html>", card("A", "W", "$1"), card("B", "G", "$1"))));
    let scraper = OrderScraper::new(&mock, &site, false);

    let summary = scraper
        .scrape_year(2017, |_| Ok(ControlFlow::Continue(())))
        .await
        .unwrap();

    assert_eq!(summary.orders, 2);
}

#[tokio::test]
async fn visitor_can_stop_the_walk() {
    let site = site();
    let idle = MockPageDriver::new();
    let urls = OrderScraper::new(&idle, &site, false);
    let page0 = urls.listing_url(2020, 0).unwrap();
    let (mock, _) = serving(vec![(
        page0,
        listing_page(2, &[card("A", "Widget", "$1.00"), card("B", "Gadget", "$2.00")]),
    )]);
    let scraper = OrderScraper::new(&mock, &site, false);

    let summary = scraper
        .scrape_year(2020, |_| Ok(ControlFlow::Break(())))
        .await
        .unwrap();

    assert_eq!(summary, YearSummary { orders: 1, pages: 1, stopped: true });
}

#[tokio::test]
async fn details_page_replaces_listing_data() {
    let site = site();
    let idle = MockPageDriver::new();
    let urls = OrderScraper::new(&idle, &site, true);
    let page0 = urls.listing_url(2020, 0).unwrap();
    let details_url = "https://shop.test/gp/your-account/order-details?orderID=A".to_string();
    let details_html = r#"<html><body>
        <div class="shipment">
          <div class="shipment-top-row"><span class="a-size-medium">Delivered</span></div>
          <div class="yohtmlc-item"><a class="a-link-normal">Widget</a>
            <span class="item-view-qty">2</span><span class="a-color-price">$1.00</span></div>
        </div>
        <div id="od-subtotals">
          <div class="a-row"><div class="a-column a-span7">Shipping:</div><div class="a-column a-span5">$4.00</div></div>
          <div class="a-row"><div class="a-column a-span7">Tax:</div><div class="a-column a-span5">$0.50</div></div>
        </div></body></html>"#
        .to_string();

    let (mock, visited) = serving(vec![
        (page0, listing_page(1, &[card("A", "Widget", "$1.00")])),
        (details_url.clone(), details_html),
    ]);
    let scraper = OrderScraper::new(&mock, &site, true);

    let mut orders = Vec::new();
    scraper
        .scrape_year(2020, |order| {
            orders.push(order);
            Ok(ControlFlow::Continue(()))
        })
        .await
        .unwrap();

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].item_count(), 2);
    assert_eq!(orders[0].shipments[0].status, "Delivered");
    assert_eq!(orders[0].effective_shipping_cents(), 400);
    assert_eq!(orders[0].effective_tax_cents(), 50);
    assert!(visited.lock().unwrap().contains(&details_url));
}

#[tokio::test]
async fn failed_details_page_keeps_listing_data() {
    let site = site();
    let mut mock = MockPageDriver::new();
    mock.expect_goto()
        .returning(|_| Err(AppError::BrowserError("timeout".into())));
    let scraper = OrderScraper::new(&mock, &site, true);

    let mut order = Order {
        id: "A".to_string(),
        details_url: Some("https://shop.test/details?orderID=A".to_string()),
        total_cents: Some(700),
        ..Order::default()
    };
    scraper.enrich_order(&mut order).await;

    assert_eq!(order.total_cents, Some(700));
}

#[tokio::test]
async fn already_signed_in_skips_waiting() {
    let site = site();
    let mut mock = MockPageDriver::new();
    mock.expect_goto()
        .with(eq("https://shop.test/gp/your-account/order-history"))
        .times(1)
        .returning(|_| Ok(()));
    mock.expect_current_url()
        .times(1)
        .returning(|| Ok("https://shop.test/gp/your-account/order-history".into()));
    mock.expect_fill().never();

    let result = ensure_signed_in(&mock, &site, &login_config(Some("me@example.com"))).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn waits_for_manual_sign_in() {
    let site = site();
    let mut mock = MockPageDriver::new();
    let mut checks = 0;
    mock.expect_current_url().returning(move || {
        checks += 1;
        if checks < 3 {
            Ok("https://shop.test/ap/signin?openid.return_to=x".into())
        } else {
            Ok("https://shop.test/gp/your-account/order-history?ref=signin".into())
        }
    });

    let result = wait_for_sign_in(&mock, &site, Duration::from_secs(5), Duration::from_millis(5)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn sign_in_times_out() {
    let site = site();
    let mut mock = MockPageDriver::new();
    mock.expect_current_url()
        .returning(|| Ok("https://shop.test/ap/signin".into()));

    let result = wait_for_sign_in(&mock, &site, Duration::from_millis(50), Duration::from_millis(5)).await;
    assert!(matches!(result, Err(AppError::LoginTimeout(_))));
}

#[tokio::test]
async fn assisted_sign_in_fills_the_form() {
    let site = site();
    let mut mock = MockPageDriver::new();
    mock.expect_goto().returning(|_| Ok(()));
    let mut checks = 0;
    mock.expect_current_url().returning(move || {
        checks += 1;
        if checks == 1 {
            Ok("https://shop.test/ap/signin".into())
        } else {
            Ok("https://shop.test/gp/your-account/order-history".into())
        }
    });
    mock.expect_fill()
        .with(eq("#ap_email"), eq("me@example.com"))
        .times(1)
        .returning(|_, _| Ok(true));
    mock.expect_fill()
        .with(eq("#ap_password"), eq("hunter2"))
        .times(1)
        .returning(|_, _| Ok(true));
    mock.expect_click().times(2).returning(|_| Ok(true));

    let result = ensure_signed_in(&mock, &site, &login_config(Some("me@example.com"))).await;
    assert!(result.is_ok());
}
