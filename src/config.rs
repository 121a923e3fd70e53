use std::path::Path;
use std::time::Duration;

use log::info;
use url::Url;

use crate::error::{RelayError, Result};
use crate::filter::CameraFilter;
use crate::proxy::{ProxyTargets, STREAM_PORT};
use crate::schedule::Cadence;



/// Configuration as sent by the display client (`SET_CONFIG`) or read from TOML.
/// Keys use the client's camelCase names; anything unknown is ignored.
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
	/// Bridge host including scheme, e.g. `http://localhost`
	pub target_host: Option<String>,
	pub target_port: Option<u16>,
	/// Milliseconds between cameras, and between roster polls once ready
	pub update_interval: u64,
	/// Milliseconds between attempts while loading or after a failed poll
	pub retry_delay: u64,
	pub controls: bool,
	pub height: u32,
	pub width: u32,
	pub animation_speed: u32,
	pub filter: Vec<String>,
}

impl Default for RelayConfig {
	fn default() -> Self {
		RelayConfig {
			target_host: None,
			target_port: None,
			update_interval: 30000,
			retry_delay: 5000,
			controls: false,
			height: 350,
			width: 700,
			animation_speed: 400,
			filter: Vec::new(),
		}
	}
}

impl RelayConfig {
	/// Reads and merges TOML files; keys in later files win.
	pub async fn read_files<P: AsRef<Path>>(paths: &[P]) -> Result<RelayConfig> {
		let mut merged = toml::Table::new();
		for path in paths {
			let contents = tokio::fs::read_to_string(path.as_ref()).await?;
			let table: toml::Table = toml::from_str(&contents)?;
			info!("Read relay config from {}", path.as_ref().display());
			merged.extend(table);
		}
		Ok(toml::Value::Table(merged).try_into()?)
	}
}

#[derive(Clone, Debug)]
pub struct RelaySettings {
	pub config: RelayConfig,
	pub filter: CameraFilter,
	pub cadence: Cadence,
	pub targets: ProxyTargets,
}

impl RelaySettings {
	pub fn from_config(config: RelayConfig) -> Result<RelaySettings> {
		let host = config.target_host.as_deref()
			.filter(|host| !host.trim().is_empty())
			.ok_or_else(|| RelayError::Config("targetHost is required".to_string()))?;
		let port = config.target_port
			.ok_or_else(|| RelayError::Config("targetPort is required".to_string()))?;

		let targets = ProxyTargets {
			api: target_url(host, port)?,
			stream: target_url(host, STREAM_PORT)?,
		};

		Ok(RelaySettings {
			filter: CameraFilter::new(&config.filter),
			cadence: Cadence {
				update_interval: Duration::from_millis(config.update_interval),
				retry_delay: Duration::from_millis(config.retry_delay),
			},
			targets,
			config,
		})
	}
}

fn target_url(host: &str, port: u16) -> Result<Url> {
	let host = host.trim();
	let with_scheme = if host.contains("://") { host.to_string() } else { format!("http://{}", host) };
	let mut url = Url::parse(&with_scheme).map_err(|err| RelayError::InvalidTarget(format!("{}: {}", host, err)))?;
	url.set_port(Some(port)).map_err(|_| RelayError::InvalidTarget(format!("{} cannot take a port", host)))?;
	Ok(url)
}
