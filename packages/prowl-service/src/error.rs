use prowl_domain::Platform;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced to callers of [`crate::SearchService`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("A non-empty credential id is required.")]
	MissingCredentialId,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("No catalog adapter is registered for {platform}.")]
	UnsupportedPlatform { platform: Platform },
	#[error("No successful attempt after {attempts} attempt(s).")]
	NoSuccessfulAttempt { attempts: usize, last_error: Option<String> },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Publish error: {message}")]
	Publish { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<prowl_storage::Error> for Error {
	fn from(err: prowl_storage::Error) -> Self {
		match err {
			prowl_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			prowl_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			prowl_storage::Error::NotFound(message) => Self::NotFound { message },
			prowl_storage::Error::Conflict(message) => Self::Storage { message },
		}
	}
}

/// Per-attempt catalog failure. Absorbed by the search loop.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
	#[error("Missing credential: {message}")]
	MissingCredential { message: String },
	#[error("Upstream unavailable: {message}")]
	UpstreamUnavailable { message: String },
	#[error("Upstream rejected the search: {message}")]
	UpstreamRejected { message: String },
	#[error("The catalog returned no items.")]
	Empty,
}
impl From<prowl_providers::Error> for AdapterError {
	fn from(err: prowl_providers::Error) -> Self {
		let message = err.to_string();

		match err {
			prowl_providers::Error::MissingCredentialField { .. } =>
				Self::MissingCredential { message },
			err if err.is_client_error() => Self::UpstreamRejected { message },
			_ => Self::UpstreamUnavailable { message },
		}
	}
}

/// Advisory capability failure. Never escapes the strategy layer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdvisoryError {
	#[error("Advisory capability unavailable: {message}")]
	Unavailable { message: String },
	#[error("Advisory answer was malformed: {message}")]
	Malformed { message: String },
}
impl From<prowl_providers::Error> for AdvisoryError {
	fn from(err: prowl_providers::Error) -> Self {
		Self::Unavailable { message: err.to_string() }
	}
}
