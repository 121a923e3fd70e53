use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::config::{RelayConfig, RelaySettings};
use crate::error::Result;
use crate::notify::{DisplayMessage, Notification, Notifier};
use crate::poller::{HttpRosterSource, RosterPoller, RosterSource};
use crate::proxy::ProxyRouter;
use crate::rotation::RotationController;
use crate::schedule::{spawn_rearming, ScheduledTask};
use crate::state::RelayState;



#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigureOutcome {
	/// First configuration: proxy armed, poller and rotation started
	Armed,
	/// Already configured: the current display was re-sent
	Refreshed,
}

struct Running {
	settings: RelaySettings,
	rotation: RotationController,
	tasks: Vec<ScheduledTask>,
}

pub struct Relay {
	state: Arc<RwLock<RelayState>>,
	notifier: Notifier,
	proxy: ProxyRouter,
	running: Mutex<Option<Running>>,
}

impl Relay {
	pub fn new(module: &str) -> Result<Relay> {
		Ok(Relay {
			state: Arc::new(RwLock::new(RelayState::new())),
			notifier: Notifier::default(),
			proxy: ProxyRouter::new(module)?,
			running: Mutex::new(None),
		})
	}

	pub fn state(&self) -> &Arc<RwLock<RelayState>> {
		&self.state
	}

	pub fn notifier(&self) -> &Notifier {
		&self.notifier
	}

	pub fn proxy(&self) -> &ProxyRouter {
		&self.proxy
	}

	pub async fn config(&self) -> Option<RelayConfig> {
		self.running.lock().await.as_ref().map(|running| running.settings.config.clone())
	}

	pub async fn is_configured(&self) -> bool {
		self.running.lock().await.is_some()
	}

	/// Handles `SET_CONFIG`. Only the first valid configuration is applied;
	/// later ones just refresh the display.
	pub async fn configure(&self, config: RelayConfig) -> Result<ConfigureOutcome> {
		if let Some(outcome) = self.refresh_if_running().await {
			return Ok(outcome);
		}
		let settings = RelaySettings::from_config(config)?;
		let source = Arc::new(HttpRosterSource::new(&settings.targets.api)?);
		info!("Polling cameras from {}", source.url());
		Ok(self.start(settings, source).await)
	}

	async fn refresh_if_running(&self) -> Option<ConfigureOutcome> {
		let running = self.running.lock().await;
		let running = running.as_ref()?;
		running.rotation.show().await;
		Some(ConfigureOutcome::Refreshed)
	}

	pub(crate) async fn start(&self, settings: RelaySettings, source: Arc<dyn RosterSource>) -> ConfigureOutcome {
		let mut running = self.running.lock().await;
		if let Some(running) = running.as_ref() {
			running.rotation.show().await;
			return ConfigureOutcome::Refreshed;
		}

		if !self.proxy.arm(settings.targets.clone()) {
			warn!("Proxy was already armed; keeping its targets");
		}
		info!("Proxying to {} and streams to {}", settings.targets.api, settings.targets.stream);
		self.notifier.send(Notification::SetMessage(DisplayMessage::Loading));

		let poller = RosterPoller::new(
			source,
			Arc::new(settings.filter.clone()),
			self.state.clone(),
			self.notifier.clone(),
			settings.cadence,
		);
		let rotation = RotationController::new(self.state.clone(), self.notifier.clone(), settings.cadence);

		let tasks = vec![
			spawn_rearming("roster poller", move || {
				let poller = poller.clone();
				async move { poller.poll().await }
			}),
			spawn_rearming("rotation", {
				let rotation = rotation.clone();
				move || {
					let rotation = rotation.clone();
					async move { rotation.tick().await }
				}
			}),
		];

		*running = Some(Running { settings, rotation, tasks });
		ConfigureOutcome::Armed
	}

	/// Stops both loops. The proxy stays armed.
	pub async fn shutdown(&self) {
		if let Some(running) = self.running.lock().await.as_ref() {
			for task in &running.tasks {
				task.cancel();
				info!("Stopped {} task", task.name());
			}
		}
	}
}
