use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Platform;

/// Canonical product record shared by every platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
	pub id: String,
	pub title: String,
	pub link: String,
	pub price: Option<String>,
	pub thumbnail: Option<String>,
	/// 1-based rank in the order the catalog returned the raw items.
	pub position: u32,
	pub source: Option<String>,
	pub data_source: Platform,
}

/// Maps raw catalog items into [`NormalizedProduct`]s.
///
/// Items without a usable title or link are skipped; the remaining items keep the position of
/// their raw item, so positions may have gaps.
pub fn normalize_items(platform: Platform, items: &[Value]) -> Vec<NormalizedProduct> {
	items
		.iter()
		.enumerate()
		.filter_map(|(idx, item)| {
			let position = idx as u32 + 1;

			match platform {
				Platform::GeneralMarketplace => marketplace_item(item, position),
				Platform::ShoppingAggregator => aggregator_item(item, position),
				Platform::SpecialtyRetailer => specialty_item(item, position),
			}
		})
		.collect()
}

fn marketplace_item(item: &Value, position: u32) -> Option<NormalizedProduct> {
	let title = text_at(item, &["ItemInfo", "Title", "DisplayValue"])?;
	let link = text_at(item, &["DetailPageURL"])?;
	let price = item
		.pointer("/Offers/Listings/0/Price/DisplayAmount")
		.and_then(Value::as_str)
		.and_then(non_empty);
	let thumbnail = text_at(item, &["Images", "Primary", "Large", "URL"])
		.or_else(|| text_at(item, &["Images", "Primary", "Medium", "URL"]));

	Some(NormalizedProduct {
		id: text_at(item, &["ASIN"])
			.unwrap_or_else(|| synthetic_id(Platform::GeneralMarketplace, position)),
		title,
		link,
		price,
		thumbnail,
		position,
		source: text_at(item, &["ItemInfo", "ByLineInfo", "Brand", "DisplayValue"]),
		data_source: Platform::GeneralMarketplace,
	})
}

fn aggregator_item(item: &Value, position: u32) -> Option<NormalizedProduct> {
	let title = text_at(item, &["title"])?;
	let link = text_at(item, &["link"]).or_else(|| text_at(item, &["product_link"]))?;
	let price = text_at(item, &["price"]).or_else(|| {
		item.get("extracted_price").and_then(Value::as_f64).map(|amount| format!("${amount:.2}"))
	});

	Some(NormalizedProduct {
		id: text_at(item, &["product_id"])
			.unwrap_or_else(|| synthetic_id(Platform::ShoppingAggregator, position)),
		title,
		link,
		price,
		thumbnail: text_at(item, &["thumbnail"]),
		position,
		source: text_at(item, &["source"]),
		data_source: Platform::ShoppingAggregator,
	})
}

fn specialty_item(item: &Value, position: u32) -> Option<NormalizedProduct> {
	let title = text_at(item, &["Name"])?;
	let link = text_at(item, &["Url"])?;
	let price = amount_at(item, "CurrentPrice").or_else(|| amount_at(item, "OriginalPrice"));

	Some(NormalizedProduct {
		id: text_at(item, &["Id"])
			.or_else(|| text_at(item, &["CatalogItemId"]))
			.unwrap_or_else(|| synthetic_id(Platform::SpecialtyRetailer, position)),
		title,
		link,
		price,
		thumbnail: text_at(item, &["ImageUrl"]),
		position,
		source: text_at(item, &["Manufacturer"]),
		data_source: Platform::SpecialtyRetailer,
	})
}

fn text_at(item: &Value, path: &[&str]) -> Option<String> {
	let mut current = item;

	for key in path {
		current = current.get(*key)?;
	}

	match current {
		Value::String(text) => non_empty(text),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}

/// Prices arrive either as numbers or numeric strings; both render as `$x`.
fn amount_at(item: &Value, key: &str) -> Option<String> {
	match item.get(key)? {
		Value::Number(number) => Some(format!("${number}")),
		Value::String(text) => {
			let text = text.trim();

			if text.is_empty() {
				None
			} else if text.starts_with('$') {
				Some(text.to_string())
			} else {
				Some(format!("${text}"))
			}
		},
		_ => None,
	}
}

fn non_empty(text: &str) -> Option<String> {
	let trimmed = text.trim();

	if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn synthetic_id(platform: Platform, position: u32) -> String {
	format!("{}-{position}", platform.as_str())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn specialty_price_accepts_numbers_and_strings() {
		let items = vec![
			json!({ "Id": "1", "Name": "Cap", "Url": "https://s/1", "CurrentPrice": "19.99" }),
			json!({ "Name": "Hat", "Url": "https://s/2", "OriginalPrice": 25 }),
		];
		let products = normalize_items(Platform::SpecialtyRetailer, &items);

		assert_eq!(products[0].price.as_deref(), Some("$19.99"));
		assert_eq!(products[1].price.as_deref(), Some("$25"));
		assert_eq!(products[1].id, "specialty_retailer-2");
	}

	#[test]
	fn aggregator_falls_back_to_product_link() {
		let items = vec![json!({ "title": "Lamp", "product_link": "https://a/lamp" })];
		let products = normalize_items(Platform::ShoppingAggregator, &items);

		assert_eq!(products[0].link, "https://a/lamp");
		assert_eq!(products[0].price, None);
	}
}
