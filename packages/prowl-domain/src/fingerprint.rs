use serde_json::Value;

use crate::{Platform, keywords::normalize_keywords};

/// Stable identity of a `(keywords, platform, config, credential)` combination.
///
/// Keywords are normalized and the config is serialized with sorted object keys, so logically
/// equal inputs hash identically. The result is 64 lowercase hex characters and is safe to use as
/// a path segment.
pub fn fingerprint(
	keywords: &str,
	platform: Platform,
	platform_config: &Value,
	credential_id: &str,
) -> String {
	let mut hasher = blake3::Hasher::new();

	for part in [
		normalize_keywords(keywords).as_str(),
		platform.as_str(),
		canonical_config(platform_config).as_str(),
		credential_id.trim(),
	] {
		hasher.update(&(part.len() as u64).to_le_bytes());
		hasher.update(part.as_bytes());
	}

	hasher.finalize().to_hex().to_string()
}

/// Serializes a platform config with object keys in sorted order. `null` is treated as `{}`.
pub fn canonical_config(value: &Value) -> String {
	let mut out = String::new();

	match value {
		Value::Null => out.push_str("{}"),
		other => write_canonical(other, &mut out),
	}

	out
}

fn write_canonical(value: &Value, out: &mut String) {
	match value {
		Value::Object(map) => {
			let mut keys = map.keys().collect::<Vec<_>>();

			keys.sort();
			out.push('{');

			for (idx, key) in keys.into_iter().enumerate() {
				if idx > 0 {
					out.push(',');
				}

				out.push_str(&Value::String(key.clone()).to_string());
				out.push(':');

				write_canonical(&map[key], out);
			}

			out.push('}');
		},
		Value::Array(items) => {
			out.push('[');

			for (idx, item) in items.iter().enumerate() {
				if idx > 0 {
					out.push(',');
				}

				write_canonical(item, out);
			}

			out.push(']');
		},
		scalar => out.push_str(&scalar.to_string()),
	}
}
