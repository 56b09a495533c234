use std::fmt;

use crate::{models::Order, parsing::format_cents};

/// Running spend totals in cents.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub orders: u32,
    pub items: u32,
    pub items_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
}

impl Totals {
    pub fn add_order(&mut self, order: &Order) {
        self.orders += 1;
        self.items += order.item_count();
        self.items_cents += order.items_value_cents();
        self.shipping_cents += order.effective_shipping_cents();
        self.tax_cents += order.effective_tax_cents();
    }

    pub fn merge(&mut self, other: &Totals) {
        self.orders += other.orders;
        self.items += other.items;
        self.items_cents += other.items_cents;
        self.shipping_cents += other.shipping_cents;
        self.tax_cents += other.tax_cents;
    }

    pub fn spent_cents(&self) -> i64 {
        self.items_cents + self.shipping_cents + self.tax_cents
    }

    pub fn display(&self, decimal_separator: char) -> TotalsDisplay<'_> {
        TotalsDisplay {
            totals: self,
            decimal_separator,
        }
    }
}

pub struct TotalsDisplay<'a> {
    totals: &'a Totals,
    decimal_separator: char,
}

impl fmt::Display for TotalsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.totals;
        let money = |cents| format_cents(cents, self.decimal_separator);
        write!(
            f,
            "{} orders, {} items: items {}, shipping {}, tax {}, spent {}",
            t.orders,
            t.items,
            money(t.items_cents),
            money(t.shipping_cents),
            money(t.tax_cents),
            money(t.spent_cents())
        )
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display('.').fmt(f)
    }
}
