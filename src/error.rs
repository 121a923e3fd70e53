pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("upstream returned status {0}")]
	UpstreamStatus(u16),

	#[error("invalid upstream target: {0}")]
	InvalidTarget(String),

	#[error("config error: {0}")]
	Config(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),
}
