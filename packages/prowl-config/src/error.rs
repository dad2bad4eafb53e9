use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read prowl config at {path:?}.")]
	ReadConfig { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse prowl config at {path:?}.")]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error(
		"{key} names {value:?}, which is not general_marketplace, shopping_aggregator or \
		specialty_retailer."
	)]
	UnknownPlatform { key: String, value: String },
	#[error("{key} names {platform}, which has no [catalogs.{platform}] section.")]
	MissingCatalog { key: String, platform: String },
	#[error("{message}")]
	Validation { message: String },
}
