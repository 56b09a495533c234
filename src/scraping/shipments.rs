use scraper::ElementRef;

use crate::models::{LineItem, Shipment};
use crate::parsing::{parse_cents, parse_quantity, split_quantity};
use crate::scraping::selectors::{first_text, shipment};

/// Shipments with their items below `scope`.
///
/// Cards without shipment boxes still yield their items, grouped into one
/// shipment with whatever status the card shows.
pub fn parse_shipments(scope: ElementRef<'_>) -> Vec<Shipment> {
    let shipments: Vec<Shipment> = scope
        .select(&shipment::SHIPMENT)
        .map(parse_shipment)
        .filter(|s| !s.items.is_empty())
        .collect();

    if !shipments.is_empty() {
        return shipments;
    }

    let items = parse_items(scope);
    if items.is_empty() {
        return Vec::new();
    }
    vec![Shipment {
        status: first_text(scope, &shipment::STATUS).unwrap_or_default(),
        items,
    }]
}

fn parse_shipment(element: ElementRef<'_>) -> Shipment {
    Shipment {
        status: first_text(element, &shipment::STATUS).unwrap_or_default(),
        items: parse_items(element),
    }
}

fn parse_items(scope: ElementRef<'_>) -> Vec<LineItem> {
    scope.select(&shipment::ITEM).filter_map(parse_item).collect()
}

fn parse_item(element: ElementRef<'_>) -> Option<LineItem> {
    let raw_name = first_text(element, &shipment::ITEM_NAME)?;
    let (prefixed_quantity, name) = split_quantity(&raw_name);

    let quantity = first_text(element, &shipment::ITEM_QUANTITY)
        .map(|q| parse_quantity(&q))
        .unwrap_or(prefixed_quantity);
    let unit_price_cents = first_text(element, &shipment::ITEM_PRICE).and_then(|p| parse_cents(&p));

    Some(LineItem {
        name,
        quantity,
        unit_price_cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn items_without_shipment_boxes_form_one_shipment() {
        let html = Html::parse_fragment(
            r#"<div id="card">
                 <div class="delivery-box__primary-text">Arriving Friday</div>
                 <div class="yohtmlc-item">
                   <a class="a-link-normal"><img src="x.jpg"></a>
                   <a class="a-link-normal">2 x Widget</a>
                   <span class="a-color-price">$4.50</span>
                 </div>
               </div>"#,
        );
        let shipments = parse_shipments(html.root_element());

        assert_eq!(shipments.len(), 1);
        assert_eq!(shipments[0].status, "Arriving Friday");
        assert_eq!(
            shipments[0].items,
            vec![LineItem {
                name: "Widget".to_string(),
                quantity: 2,
                unit_price_cents: Some(450),
            }]
        );
    }

    #[test]
    fn quantity_badge_overrides_name_prefix() {
        let html = Html::parse_fragment(
            r#"<div class="shipment">
                 <div class="yohtmlc-item">
                   <span class="item-view-qty">3</span>
                   <a class="a-link-normal">Batteries</a>
                 </div>
               </div>"#,
        );
        let shipments = parse_shipments(html.root_element());

        assert_eq!(shipments[0].status, "");
        assert_eq!(shipments[0].items[0].quantity, 3);
        assert_eq!(shipments[0].items[0].unit_price_cents, None);
    }

    #[test]
    fn empty_scope_has_no_shipments() {
        let html = Html::parse_fragment("<div><p>Nothing here</p></div>");
        assert!(parse_shipments(html.root_element()).is_empty());
    }
}
