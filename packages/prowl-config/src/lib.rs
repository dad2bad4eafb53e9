mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CatalogProviderConfig, Catalogs, Config, LlmProviderConfig, Postgres, Providers, Publish,
	Routing, Search, Service, Storage,
};

use std::{fs, path::Path};

pub const PLATFORMS: [&str; 3] =
	["general_marketplace", "shopping_aggregator", "specialty_retailer"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.advisory.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.advisory.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.providers.advisory.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider advisory api_key must be non-empty.".to_string(),
		});
	}
	if !cfg.providers.advisory.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.advisory.temperature must be a finite number.".to_string(),
		});
	}

	let configured = cfg.catalogs.configured();

	if configured.is_empty() {
		return Err(Error::Validation {
			message: "At least one [catalogs.*] section must be configured.".to_string(),
		});
	}

	for (name, catalog) in &configured {
		if catalog.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("catalogs.{name}.api_base must be non-empty."),
			});
		}
		if catalog.page_size == 0 {
			return Err(Error::Validation {
				message: format!("catalogs.{name}.page_size must be greater than zero."),
			});
		}
	}

	let search = &cfg.search;

	if search.max_attempts == 0 {
		return Err(Error::Validation {
			message: "search.max_attempts must be greater than zero.".to_string(),
		});
	}
	if search.target_product_count == 0 {
		return Err(Error::Validation {
			message: "search.target_product_count must be greater than zero.".to_string(),
		});
	}
	if search.ideal_product_count < search.target_product_count {
		return Err(Error::Validation {
			message: "search.ideal_product_count must be at least search.target_product_count."
				.to_string(),
		});
	}
	if search.max_combinations == 0 {
		return Err(Error::Validation {
			message: "search.max_combinations must be greater than zero.".to_string(),
		});
	}
	if search.max_keyword_words == 0 {
		return Err(Error::Validation {
			message: "search.max_keyword_words must be greater than zero.".to_string(),
		});
	}

	validate_platform(cfg, "routing.default_platform", &cfg.routing.default_platform)?;

	for (domain, platform) in &cfg.routing.domain_overrides {
		if domain.trim().is_empty() {
			return Err(Error::Validation {
				message: "routing.domain_overrides keys must be non-empty.".to_string(),
			});
		}

		validate_platform(cfg, &format!("routing.domain_overrides.{domain:?}"), platform)?;
	}

	for (credential_id, platforms) in &cfg.credentials {
		if credential_id.trim().is_empty() {
			return Err(Error::Validation {
				message: "credentials keys must be non-empty.".to_string(),
			});
		}

		for platform in platforms.keys() {
			if !PLATFORMS.contains(&platform.as_str()) {
				return Err(Error::UnknownPlatform {
					key: format!("credentials.{credential_id}"),
					value: platform.clone(),
				});
			}
		}
	}

	Ok(())
}

fn validate_platform(cfg: &Config, key: &str, platform: &str) -> Result<()> {
	if !PLATFORMS.contains(&platform) {
		return Err(Error::UnknownPlatform { key: key.to_string(), value: platform.to_string() });
	}
	if !cfg.catalogs.is_configured(platform) {
		return Err(Error::MissingCatalog { key: key.to_string(), platform: platform.to_string() });
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.routing.domain_overrides = cfg
		.routing
		.domain_overrides
		.drain()
		.map(|(domain, platform)| {
			(domain.trim().trim_end_matches('.').to_ascii_lowercase(), platform.trim().to_string())
		})
		.collect();
	cfg.routing.default_platform = cfg.routing.default_platform.trim().to_string();

	if cfg.publish.root.as_deref().map(|root| root.trim().is_empty()).unwrap_or(false) {
		cfg.publish.root = None;
	}
}
