use std::collections::HashMap;

use serde_json::{Map, Value};

use prowl_config::Config;
use prowl_domain::Platform;

use crate::{BoxFuture, Credential, CredentialResolver};

const ENV_PREFIX: &str = "env:";

/// Credentials declared under `[credentials.<id>.<platform>]`.
///
/// String values of the form `env:NAME` are read from the process environment on every
/// resolution; a missing variable drops the field.
#[derive(Clone, Debug, Default)]
pub struct ConfigCredentials {
	entries: HashMap<(String, Platform), Map<String, Value>>,
}
impl ConfigCredentials {
	pub fn from_config(cfg: &Config) -> Self {
		let mut credentials = Self::default();

		for (credential_id, platforms) in &cfg.credentials {
			for (platform, fields) in platforms {
				match platform.parse::<Platform>() {
					Ok(platform) => credentials.insert(credential_id, platform, fields.clone()),
					Err(err) => {
						tracing::warn!(
							credential_id = credential_id.as_str(),
							error = %err,
							"Ignoring credential for unknown platform."
						);
					},
				}
			}
		}

		credentials
	}

	pub fn insert(&mut self, credential_id: &str, platform: Platform, fields: Map<String, Value>) {
		self.entries.insert((credential_id.to_string(), platform), fields);
	}

	fn lookup(&self, credential_id: &str, platform: Platform) -> Option<Credential> {
		let fields = self.entries.get(&(credential_id.to_string(), platform))?;
		let mut resolved = Map::new();

		for (name, value) in fields {
			match value.as_str().and_then(|raw| raw.strip_prefix(ENV_PREFIX)) {
				Some(var) => match std::env::var(var.trim()) {
					Ok(secret) => {
						resolved.insert(name.clone(), Value::String(secret));
					},
					Err(_) => {
						tracing::warn!(
							credential_id,
							%platform,
							field = name.as_str(),
							variable = var,
							"Credential environment variable is not set."
						);
					},
				},
				None => {
					resolved.insert(name.clone(), value.clone());
				},
			}
		}

		Some(Credential { id: credential_id.to_string(), fields: resolved })
	}
}
impl CredentialResolver for ConfigCredentials {
	fn resolve<'a>(
		&'a self,
		credential_id: &'a str,
		platform: Platform,
	) -> BoxFuture<'a, Option<Credential>> {
		Box::pin(async move { self.lookup(credential_id, platform) })
	}
}
