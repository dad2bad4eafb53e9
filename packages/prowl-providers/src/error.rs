pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Transport(#[from] reqwest::Error),
	#[error("Upstream responded with HTTP {status}: {body}")]
	Status { status: u16, body: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Credential field {field:?} is missing or empty.")]
	MissingCredentialField { field: String },
}
impl Error {
	/// Transport failures, throttling and 5xx responses are worth another try.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Transport(err) => !err.is_builder() && !err.is_decode(),
			Self::Status { status, .. } => *status == 429 || *status >= 500,
			_ => false,
		}
	}

	/// The upstream understood the call and refused it, or answered with something unusable.
	pub fn is_client_error(&self) -> bool {
		match self {
			Self::Status { status, .. } => (400..500).contains(status) && *status != 429,
			Self::Transport(err) => err.is_decode(),
			Self::SerdeJson(_) | Self::InvalidResponse { .. } => true,
			_ => false,
		}
	}
}
