use scraper::Html;

use crate::models::{Order, Shipment};
use crate::parsing::{parse_cents, parse_order_date};
use crate::scraping::selectors::{details, first_text, text_of};
use crate::scraping::shipments::parse_shipments;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryField {
    ItemsSubtotal,
    Shipping,
    TotalBeforeTax,
    Tax,
    /// VAT already contained in the gross prices; not a charge of its own.
    IncludedTax,
    GrandTotal,
}

/// The charge rows of the order summary box.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub items_subtotal: Option<i64>,
    pub shipping: Option<i64>,
    pub total_before_tax: Option<i64>,
    pub tax: Option<i64>,
    pub included_tax: Option<i64>,
    pub grand_total: Option<i64>,
}

#[derive(Debug, Default)]
pub struct OrderDetails {
    pub date_text: Option<String>,
    pub shipments: Vec<Shipment>,
    pub summary: OrderSummary,
}

impl OrderDetails {
    /// Replaces listing data on `order` with whatever the details page had.
    pub fn apply_to(self, order: &mut Order) {
        if let Some(date_text) = self.date_text {
            if let Some(date) = parse_order_date(&date_text) {
                order.date = Some(date);
                order.date_text = date_text;
            }
        }
        if !self.shipments.is_empty() {
            order.shipments = self.shipments;
        }

        let summary = self.summary;
        if let Some(included) = summary.included_tax {
            tracing::debug!("Order {}: prices include {} cents VAT", order.id, included);
        }
        order.total_cents = summary.grand_total.or(order.total_cents);
        order.items_subtotal_cents = summary.items_subtotal;
        order.subtotal_cents = summary.total_before_tax;
        order.shipping_cents = summary.shipping;
        order.tax_cents = summary.tax;
    }
}

pub fn parse_order_details(html: &str) -> OrderDetails {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut summary = OrderSummary::default();
    for row in root.select(&details::SUMMARY_ROW) {
        let label = first_text(row, &details::SUMMARY_LABEL);
        let value = first_text(row, &details::SUMMARY_VALUE);
        let (Some(label), Some(value)) = (label, value) else {
            // Rows without the two-column layout carry label and value together.
            let text = text_of(row);
            if let (Some(field), Some(cents)) = (classify_summary_label(&text), parse_cents(&text)) {
                summary.record(field, cents);
            }
            continue;
        };
        if let (Some(field), Some(cents)) = (classify_summary_label(&label), parse_cents(&value)) {
            summary.record(field, cents);
        }
    }

    OrderDetails {
        date_text: first_text(root, &details::ORDER_DATE),
        shipments: parse_shipments(root),
        summary,
    }
}

impl OrderSummary {
    fn record(&mut self, field: SummaryField, cents: i64) {
        match field {
            // Promotions show up as extra negative shipping rows.
            SummaryField::Shipping => *self.shipping.get_or_insert(0) += cents,
            SummaryField::Tax => *self.tax.get_or_insert(0) += cents,
            SummaryField::IncludedTax => *self.included_tax.get_or_insert(0) += cents,
            SummaryField::ItemsSubtotal => self.items_subtotal = Some(cents),
            SummaryField::TotalBeforeTax => self.total_before_tax = Some(cents),
            // Later rows like "Refund Total" must not replace it.
            SummaryField::GrandTotal => {
                self.grand_total.get_or_insert(cents);
            }
        }
    }
}

fn classify_summary_label(label: &str) -> Option<SummaryField> {
    let label = label.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| label.contains(n));

    if has(&["refund", "erstattung"]) {
        None
    } else if has(&["before tax", "vor steuer", "ohne mwst"]) {
        Some(SummaryField::TotalBeforeTax)
    } else if has(&["subtotal", "zwischensumme"]) {
        Some(SummaryField::ItemsSubtotal)
    } else if has(&["shipping", "postage", "versand"]) {
        Some(SummaryField::Shipping)
    } else if has(&["grand total", "gesamtsumme", "gesamtbetrag"]) {
        Some(SummaryField::GrandTotal)
    } else if has(&["enthalten", "inkl.", "incl.", "included"]) {
        Some(SummaryField::IncludedTax)
    } else if has(&["tax", "mwst", "ust.", "umsatzsteuer"]) {
        Some(SummaryField::Tax)
    } else if has(&["total", "summe"]) {
        Some(SummaryField::GrandTotal)
    } else {
        None
    }
}
