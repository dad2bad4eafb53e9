//! RFC 3339 timestamps for persisted search attempts.

use serde::{Deserialize, Deserializer, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&format(value).map_err(serde::ser::Error::custom)?)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	parse(&String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
}

/// Nullable timestamps, such as the execution time of an attempt that never ran.
pub mod option {
	use serde::{Deserialize, Deserializer, Serializer};
	use time::OffsetDateTime;

	pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(value) => super::serialize(value, serializer),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<String>::deserialize(deserializer)?
			.map(|raw| super::parse(&raw))
			.transpose()
			.map_err(serde::de::Error::custom)
	}
}

fn format(value: &OffsetDateTime) -> Result<String, String> {
	value.format(&Rfc3339).map_err(|err| format!("Cannot format {value} as RFC 3339: {err}."))
}

fn parse(raw: &str) -> Result<OffsetDateTime, String> {
	OffsetDateTime::parse(raw, &Rfc3339)
		.map_err(|err| format!("Invalid RFC 3339 timestamp {raw:?}: {err}."))
}
