use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
	GeneralMarketplace,
	ShoppingAggregator,
	SpecialtyRetailer,
}
impl Platform {
	pub const ALL: [Self; 3] =
		[Self::GeneralMarketplace, Self::ShoppingAggregator, Self::SpecialtyRetailer];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::GeneralMarketplace => "general_marketplace",
			Self::ShoppingAggregator => "shopping_aggregator",
			Self::SpecialtyRetailer => "specialty_retailer",
		}
	}
}
impl fmt::Display for Platform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Platform {
	type Err = ParseEnumError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|platform| platform.as_str() == raw.trim())
			.ok_or_else(|| ParseEnumError::new("platform", raw))
	}
}

/// Lifecycle of a persisted search attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
	Pending,
	Searching,
	Completed,
	Failed,
	Rejected,
}
impl SearchStatus {
	pub const ALL: [Self; 5] =
		[Self::Pending, Self::Searching, Self::Completed, Self::Failed, Self::Rejected];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Searching => "searching",
			Self::Completed => "completed",
			Self::Failed => "failed",
			Self::Rejected => "rejected",
		}
	}
}
impl fmt::Display for SearchStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for SearchStatus {
	type Err = ParseEnumError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|status| status.as_str() == raw.trim())
			.ok_or_else(|| ParseEnumError::new("search status", raw))
	}
}

/// High-level progress mirrored onto a content target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSearchStatus {
	Pending,
	Searching,
	Completed,
	Failed,
}
impl ContentSearchStatus {
	pub const ALL: [Self; 4] = [Self::Pending, Self::Searching, Self::Completed, Self::Failed];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Searching => "searching",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}
}
impl fmt::Display for ContentSearchStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for ContentSearchStatus {
	type Err = ParseEnumError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|status| status.as_str() == raw.trim())
			.ok_or_else(|| ParseEnumError::new("content search status", raw))
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseEnumError {
	pub kind: &'static str,
	pub value: String,
}
impl ParseEnumError {
	fn new(kind: &'static str, value: &str) -> Self {
		Self { kind, value: value.to_string() }
	}
}
impl fmt::Display for ParseEnumError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown {}: {:?}.", self.kind, self.value)
	}
}
impl std::error::Error for ParseEnumError {}
