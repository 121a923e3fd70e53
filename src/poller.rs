use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::RwLock;
use url::Url;

use crate::common::RawRoster;
use crate::error::{RelayError, Result};
use crate::filter::CameraFilter;
use crate::notify::{Notification, Notifier};
use crate::schedule::Cadence;
use crate::state::RelayState;



#[rocket::async_trait]
pub trait RosterSource: Send + Sync {
	async fn fetch(&self) -> Result<RawRoster>;
}

pub struct HttpRosterSource {
	client: reqwest::Client,
	url: Url,
}

impl HttpRosterSource {
	pub fn new(api: &Url) -> Result<HttpRosterSource> {
		let url = api.join("cameras")
			.map_err(|err| RelayError::InvalidTarget(format!("{}: {}", api, err)))?;
		let client = reqwest::Client::builder()
			.timeout(Duration::from_secs(10))
			.build()?;

		Ok(HttpRosterSource { client, url })
	}

	pub fn url(&self) -> &Url {
		&self.url
	}
}

#[rocket::async_trait]
impl RosterSource for HttpRosterSource {
	async fn fetch(&self) -> Result<RawRoster> {
		let response = self.client.get(self.url.clone()).send().await?;
		if !response.status().is_success() {
			return Err(RelayError::UpstreamStatus(response.status().as_u16()));
		}
		let body = response.bytes().await?;
		// A body that is not JSON is a malformed payload, which means no cameras
		Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
			warn!("Camera list from {} is not JSON; error was {}", self.url, err);
			RawRoster::Null
		}))
	}
}

#[derive(Clone)]
pub struct RosterPoller {
	source: Arc<dyn RosterSource>,
	filter: Arc<CameraFilter>,
	state: Arc<RwLock<RelayState>>,
	notifier: Notifier,
	cadence: Cadence,
}

impl RosterPoller {
	pub fn new(
		source: Arc<dyn RosterSource>,
		filter: Arc<CameraFilter>,
		state: Arc<RwLock<RelayState>>,
		notifier: Notifier,
		cadence: Cadence,
	) -> RosterPoller {
		RosterPoller { source, filter, state, notifier, cadence }
	}

	/// Runs one poll and returns the delay before the next one.
	/// A failed fetch empties the roster instead of keeping stale cameras.
	pub async fn poll(&self) -> Duration {
		info!("Requesting cameras...");
		let fetched = self.source.fetch().await;

		let (count, succeeded) = {
			let mut state = self.state.write().await;
			let succeeded = match fetched {
				Ok(raw) => {
					state.absorb(&raw, &self.filter);
					true
				},
				Err(err) => {
					error!("Failed to fetch cameras; error was {}", err);
					state.clear_roster();
					false
				}
			};
			state.rotation.mark_ready();
			(state.registry.len(), succeeded)
		};

		self.notifier.send(Notification::ReadyState(true));
		self.notifier.send(Notification::CamerasUpdated(count));
		info!("Request cameras finished");

		// A failure always retries at the faster cadence
		self.cadence.next(succeeded)
	}
}
