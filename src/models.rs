use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::parsing::infer_shipping;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: Option<i64>,
}

impl LineItem {
    pub fn line_total_cents(&self) -> Option<i64> {
        self.unit_price_cents.map(|price| price * i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub status: String,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Order date as shown on the page.
    pub date_text: String,
    pub date: Option<NaiveDate>,
    pub details_url: Option<String>,
    pub total_cents: Option<i64>,
    /// Item subtotal stated by the order summary. Covers items shown without a price.
    pub items_subtotal_cents: Option<i64>,
    /// Order-level subtotal before tax, used to infer shipping.
    pub subtotal_cents: Option<i64>,
    pub shipping_cents: Option<i64>,
    pub tax_cents: Option<i64>,
    pub shipments: Vec<Shipment>,
}

impl Order {
    pub fn items(&self) -> impl Iterator<Item = &LineItem> {
        self.shipments.iter().flat_map(|s| s.items.iter())
    }

    pub fn item_count(&self) -> u32 {
        self.items().map(|item| item.quantity).sum()
    }

    pub fn items_sum_cents(&self) -> i64 {
        self.items().filter_map(LineItem::line_total_cents).sum()
    }

    /// What the items cost: the stated item subtotal, else the sum of priced items.
    pub fn items_value_cents(&self) -> i64 {
        self.items_subtotal_cents
            .unwrap_or_else(|| self.items_sum_cents())
    }

    /// ISO date when the page date could be parsed, the raw text otherwise.
    pub fn display_date(&self) -> String {
        match self.date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => self.date_text.clone(),
        }
    }

    /// Stated shipping, or the subtotal minus the item sum when the page does not list it.
    pub fn effective_shipping_cents(&self) -> i64 {
        if let Some(shipping) = self.shipping_cents {
            return shipping;
        }
        let subtotal = self.subtotal_cents.or(match self.tax_cents {
            Some(tax) => self.total_cents.map(|total| total - tax),
            None => self.total_cents,
        });
        match subtotal {
            Some(subtotal) => infer_shipping(subtotal, self.items_value_cents()),
            None => 0,
        }
    }

    pub fn effective_tax_cents(&self) -> i64 {
        self.tax_cents.unwrap_or(0)
    }
}
