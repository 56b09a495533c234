use crate::{config::OutputConfig, error::AppError, models::Order, parsing::format_cents};
use csv::{QuoteStyle, Writer, WriterBuilder};
use serde::Serialize;
use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Unit Price")]
    pub unit_price: String,
    #[serde(rename = "Total")]
    pub total: String,
    #[serde(rename = "Tags")]
    pub tags: String,
}

/// Appends order rows to the output file, one flush per order.
pub struct CsvGenerator {
    output_path: PathBuf,
    tag: String,
    decimal_separator: char,
    writer: Option<Writer<File>>,
}

impl CsvGenerator {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            output_path: config.path.clone(),
            tag: config.tag.clone(),
            decimal_separator: config.decimal_separator(),
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// Opens the file for appending. The header goes in only when the file is empty.
    pub fn open(&mut self) -> Result<(), AppError> {
        if let Some(parent) = self.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)?;
        let is_empty = file.metadata()?.len() == 0;

        let writer = WriterBuilder::new()
            .delimiter(b';')
            .quote_style(QuoteStyle::Always)
            .has_headers(is_empty)
            .from_writer(file);

        tracing::info!(
            "Writing rows to {} ({})",
            self.output_path.display(),
            if is_empty { "new file" } else { "appending" }
        );
        self.writer = Some(writer);
        Ok(())
    }

    /// Writes every row of `order` and flushes. Returns the number of rows written.
    pub fn write_order(&mut self, order: &Order) -> Result<usize, AppError> {
        if self.writer.is_none() {
            self.open()?;
        }
        let rows = rows_for_order(order, &self.tag, self.decimal_separator);
        let Some(writer) = self.writer.as_mut() else {
            return Ok(0);
        };

        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(rows.len())
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

/// One row per line item, then a shipping row and a tax row when they are not zero.
pub fn rows_for_order(order: &Order, tag: &str, decimal_separator: char) -> Vec<CsvRow> {
    let date = order.display_date();
    let money = |cents: Option<i64>| {
        cents
            .map(|c| format_cents(c, decimal_separator))
            .unwrap_or_default()
    };

    let mut rows = Vec::new();
    for shipment in &order.shipments {
        for item in &shipment.items {
            rows.push(CsvRow {
                date: date.clone(),
                status: shipment.status.clone(),
                quantity: item.quantity,
                item: item.name.clone(),
                unit_price: money(item.unit_price_cents),
                total: money(item.line_total_cents()),
                tags: tag.to_string(),
            });
        }
    }

    let charges = [
        ("Shipping", order.effective_shipping_cents()),
        ("Tax", order.effective_tax_cents()),
    ];
    for (label, cents) in charges {
        if cents > 0 {
            rows.push(CsvRow {
                date: date.clone(),
                status: label.to_string(),
                quantity: 1,
                item: label.to_string(),
                unit_price: money(Some(cents)),
                total: money(Some(cents)),
                tags: tag.to_string(),
            });
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, Shipment};
    use chrono::NaiveDate;

    fn order() -> Order {
        Order {
            id: "111".to_string(),
            date: NaiveDate::from_ymd_opt(2021, 3, 3),
            total_cents: Some(2798),
            tax_cents: Some(200),
            shipments: vec![Shipment {
                status: "Delivered".to_string(),
                items: vec![
                    LineItem {
                        name: "Widget \"Pro\"; blue".to_string(),
                        quantity: 2,
                        unit_price_cents: Some(500),
                    },
                    LineItem {
                        name: "Mystery".to_string(),
                        quantity: 1,
                        unit_price_cents: None,
                    },
                ],
            }],
            ..Order::default()
        }
    }

    fn output(path: PathBuf) -> OutputConfig {
        OutputConfig {
            path,
            tag: "home".to_string(),
            decimal_separator: ",".to_string(),
        }
    }

    #[test]
    fn builds_item_and_charge_rows() {
        let rows = rows_for_order(&order(), "", '.');

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].date, "2021-03-03");
        assert_eq!(rows[0].unit_price, "5.00");
        assert_eq!(rows[0].total, "10.00");
        assert_eq!(rows[1].unit_price, "");
        assert_eq!(rows[1].total, "");
        // 27.98 total - 2.00 tax - 10.00 items
        assert_eq!(rows[2].item, "Shipping");
        assert_eq!(rows[2].total, "15.98");
        assert_eq!(rows[3].item, "Tax");
        assert_eq!(rows[3].total, "2.00");
    }

    #[test]
    fn zero_charges_are_left_out() {
        let order = Order {
            total_cents: None,
            tax_cents: None,
            ..order()
        };
        assert_eq!(rows_for_order(&order, "", '.').len(), 2);
    }

    #[test]
    fn writes_quoted_semicolon_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("orders.csv");
        let mut generator = CsvGenerator::new(&output(path.clone()));

        assert_eq!(generator.write_order(&order()).unwrap(), 4);
        generator.finish().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some(r#""Date";"Status";"Quantity";"Item";"Unit Price";"Total";"Tags""#)
        );
        assert_eq!(
            lines.next(),
            Some(r#""2021-03-03";"Delivered";"2";"Widget ""Pro""; blue";"5,00";"10,00";"home""#)
        );
    }

    #[test]
    fn header_is_written_once_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");

        for _ in 0..2 {
            let mut generator = CsvGenerator::new(&output(path.clone()));
            generator.open().unwrap();
            generator.write_order(&order()).unwrap();
            generator.finish().unwrap();
        }

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("\"Date\"").count(), 1);
        assert_eq!(written.lines().count(), 1 + 2 * 4);
    }
}
