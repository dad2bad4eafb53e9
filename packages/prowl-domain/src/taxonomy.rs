//! Fixed platform parameter vocabularies and their safe defaults.

use serde_json::{Map, Value, json};

use crate::Platform;

pub const BROADEST_SEARCH_INDEX: &str = "All";

/// Marketplace search indexes as `(key, display name)`.
pub const SEARCH_INDEXES: &[(&str, &str)] = &[
	("All", "All Departments"),
	("Apparel", "Clothing & Accessories"),
	("Appliances", "Appliances"),
	("ArtsAndCrafts", "Arts, Crafts & Sewing"),
	("Automotive", "Automotive Parts & Accessories"),
	("Baby", "Baby"),
	("Beauty", "Beauty & Personal Care"),
	("Books", "Books"),
	("Collectibles", "Collectibles & Fine Art"),
	("Computers", "Computers"),
	("Electronics", "Electronics"),
	("Fashion", "Clothing, Shoes & Jewelry"),
	("FashionBaby", "Clothing, Shoes & Jewelry Baby"),
	("FashionBoys", "Clothing, Shoes & Jewelry Boys"),
	("FashionGirls", "Clothing, Shoes & Jewelry Girls"),
	("FashionMen", "Clothing, Shoes & Jewelry Men"),
	("FashionWomen", "Clothing, Shoes & Jewelry Women"),
	("GardenAndOutdoor", "Garden & Outdoor"),
	("GiftCards", "Gift Cards"),
	("GroceryAndGourmetFood", "Grocery & Gourmet Food"),
	("Handmade", "Handmade"),
	("HealthPersonalCare", "Health, Household & Baby Care"),
	("HomeAndKitchen", "Home & Kitchen"),
	("Industrial", "Industrial & Scientific"),
	("Jewelry", "Jewelry"),
	("Luggage", "Luggage & Travel Gear"),
	("LuxuryBeauty", "Luxury Beauty"),
	("MobileAndAccessories", "Cell Phones & Accessories"),
	("MoviesAndTV", "Movies & TV"),
	("Music", "CDs & Vinyl"),
	("MusicalInstruments", "Musical Instruments"),
	("OfficeProducts", "Office Products"),
	("PetSupplies", "Pet Supplies"),
	("Photo", "Camera & Photo"),
	("Shoes", "Shoes"),
	("Software", "Software"),
	("SportsAndOutdoors", "Sports & Outdoors"),
	("ToolsAndHomeImprovement", "Tools & Home Improvement"),
	("ToysAndGames", "Toys & Games"),
	("VideoGames", "Video Games"),
	("Watches", "Watches"),
];

/// Aggregator locations as `(location, country code)`.
pub const AGGREGATOR_LOCATIONS: &[(&str, &str)] = &[
	("United States", "us"),
	("Canada", "ca"),
	("United Kingdom", "uk"),
	("Australia", "au"),
	("Germany", "de"),
	("France", "fr"),
	("Japan", "jp"),
];

pub const AGGREGATOR_LANGUAGES: &[&str] = &["en", "es", "fr", "de", "ja", "pt"];

/// Exact search-index key for a possibly mis-cased advisory answer.
pub fn search_index(raw: &str) -> Option<&'static str> {
	let raw = raw.trim();

	SEARCH_INDEXES.iter().map(|(key, _)| *key).find(|key| key.eq_ignore_ascii_case(raw))
}

pub fn marketplace_config(search_index: &str) -> Value {
	json!({ "searchIndex": search_index })
}

pub fn aggregator_config(location: &str, language: &str, country: &str) -> Value {
	json!({ "location": location, "language": language, "country": country })
}

/// The config that casts the widest net on `platform`.
pub fn broadest_config(platform: Platform) -> Value {
	match platform {
		Platform::GeneralMarketplace => marketplace_config(BROADEST_SEARCH_INDEX),
		Platform::ShoppingAggregator => aggregator_config("United States", "en", "us"),
		Platform::SpecialtyRetailer => Value::Object(Map::new()),
	}
}

/// Coerces an advisory-proposed aggregator config onto the allowed vocabularies.
///
/// Unknown locations and languages fall back to the defaults; the country code always follows
/// the location.
pub fn coerce_aggregator_config(proposed: &Value) -> Value {
	let location = proposed
		.get("location")
		.and_then(Value::as_str)
		.and_then(|raw| {
			AGGREGATOR_LOCATIONS.iter().find(|(name, _)| name.eq_ignore_ascii_case(raw.trim()))
		})
		.copied()
		.unwrap_or(AGGREGATOR_LOCATIONS[0]);
	let language = proposed
		.get("language")
		.and_then(Value::as_str)
		.and_then(|raw| {
			AGGREGATOR_LANGUAGES.iter().find(|lang| lang.eq_ignore_ascii_case(raw.trim()))
		})
		.copied()
		.unwrap_or(AGGREGATOR_LANGUAGES[0]);

	aggregator_config(location.0, language, location.1)
}

/// Marketplace config with a known search index, `All` otherwise.
pub fn coerce_marketplace_config(proposed: &Value) -> Value {
	let index = proposed
		.get("searchIndex")
		.and_then(Value::as_str)
		.and_then(search_index)
		.unwrap_or(BROADEST_SEARCH_INDEX);

	marketplace_config(index)
}

/// Maps a proposed config onto values the `platform` catalog accepts.
pub fn coerce_config(platform: Platform, proposed: &Value) -> Value {
	match platform {
		Platform::GeneralMarketplace => coerce_marketplace_config(proposed),
		Platform::ShoppingAggregator => coerce_aggregator_config(proposed),
		Platform::SpecialtyRetailer => broadest_config(platform),
	}
}
