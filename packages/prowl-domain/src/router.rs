use std::collections::HashMap;

use crate::Platform;

/// Maps a target domain to the platform whose catalog should be searched.
#[derive(Clone, Debug)]
pub struct PlatformRouter {
	overrides: HashMap<String, Platform>,
	default: Platform,
}
impl PlatformRouter {
	pub fn new(default: Platform) -> Self {
		Self { overrides: HashMap::new(), default }
	}

	/// Registers an override keyed by the last two labels of `domain`.
	pub fn with_override(mut self, domain: &str, platform: Platform) -> Self {
		if let Some(key) = registrable_domain(domain) {
			self.overrides.insert(key, platform);
		}

		self
	}

	pub fn default_platform(&self) -> Platform {
		self.default
	}

	/// Accepts either a bare hostname or a full URL.
	pub fn route(&self, domain: &str) -> Platform {
		registrable_domain(domain)
			.and_then(|key| self.overrides.get(&key).copied())
			.unwrap_or(self.default)
	}
}

/// Lower-cased hostname of a URL or bare host, without port or trailing dot.
pub fn hostname(raw: &str) -> Option<String> {
	let trimmed = raw.trim();
	let without_scheme = match trimmed.split_once("://") {
		Some((_, rest)) => rest,
		None => trimmed,
	};
	let authority = without_scheme.split(['/', '?', '#']).next().unwrap_or_default();
	let host = authority.rsplit_once('@').map(|(_, host)| host).unwrap_or(authority);
	let host = host.split(':').next().unwrap_or_default().trim_end_matches('.');

	if host.is_empty() { None } else { Some(host.to_ascii_lowercase()) }
}

fn registrable_domain(raw: &str) -> Option<String> {
	let host = hostname(raw)?;
	let labels = host.split('.').filter(|label| !label.is_empty()).collect::<Vec<_>>();

	match labels.len() {
		0 => None,
		1 => Some(labels[0].to_string()),
		n => Some(format!("{}.{}", labels[n - 2], labels[n - 1])),
	}
}
