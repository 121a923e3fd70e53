use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::sync::RwLock;

use crate::notify::{DisplayMessage, Notification, Notifier};
use crate::schedule::Cadence;
use crate::state::RelayState;



#[derive(Clone)]
pub struct RotationController {
	state: Arc<RwLock<RelayState>>,
	notifier: Notifier,
	cadence: Cadence,
}

impl RotationController {
	pub fn new(state: Arc<RwLock<RelayState>>, notifier: Notifier, cadence: Cadence) -> RotationController {
		RotationController { state, notifier, cadence }
	}

	/// Shows the current entry, advances the index and returns the delay before the next tick.
	pub async fn tick(&self) -> Duration {
		let (display, ready) = {
			let mut state = self.state.write().await;
			let display = state.display();
			state.advance();
			(display, state.rotation.is_ready())
		};
		self.emit(display);
		self.cadence.next(ready)
	}

	/// Re-emits the current entry without moving the index.
	pub async fn show(&self) {
		let display = self.state.write().await.display();
		self.emit(display);
	}

	fn emit(&self, display: Notification) {
		match &display {
			Notification::SetMessage(DisplayMessage::Loading) => info!("Still loading"),
			Notification::SetMessage(DisplayMessage::NoCams) => info!("No cameras found. skipping"),
			Notification::SetCamera(camera) => info!("Showing camera {}", camera.nickname),
			_ => {},
		}
		self.notifier.send(display);
	}
}



#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::time::Duration;

	use serde_json::json;
	use tokio::sync::RwLock;

	use super::RotationController;
	use crate::filter::CameraFilter;
	use crate::notify::{DisplayMessage, Notification, Notifier};
	use crate::schedule::Cadence;
	use crate::state::RelayState;

	const CADENCE: Cadence = Cadence {
		update_interval: Duration::from_secs(30),
		retry_delay: Duration::from_secs(5),
	};

	#[tokio::test]
	async fn cycles_through_cameras() {
		let state = Arc::new(RwLock::new(RelayState::new()));
		{
			let mut state = state.write().await;
			state.rotation.mark_ready();
			state.absorb(&json!({"cameras": {"a": {"nickname": "A"}, "b": {"nickname": "B"}}}), &CameraFilter::default());
		}
		let notifier = Notifier::default();
		let mut events = notifier.subscribe();
		let rotation = RotationController::new(state.clone(), notifier, CADENCE);

		let mut shown = Vec::new();
		for _ in 0..3 {
			assert_eq!(rotation.tick().await, Duration::from_secs(30));
			match events.recv().await.expect("event") {
				Notification::SetCamera(camera) => shown.push(camera.nickname),
				other => panic!("unexpected event {:?}", other),
			}
		}
		assert_eq!(shown, vec!["A", "B", "A"]);
	}

	#[tokio::test]
	async fn loading_uses_retry_delay() {
		let state = Arc::new(RwLock::new(RelayState::new()));
		let notifier = Notifier::default();
		let mut events = notifier.subscribe();
		let rotation = RotationController::new(state.clone(), notifier, CADENCE);

		assert_eq!(rotation.tick().await, Duration::from_secs(5));
		assert_eq!(events.recv().await.expect("event"), Notification::SetMessage(DisplayMessage::Loading));
	}

	#[tokio::test]
	async fn show_does_not_advance() {
		let state = Arc::new(RwLock::new(RelayState::new()));
		{
			let mut state = state.write().await;
			state.rotation.mark_ready();
			state.absorb(&json!({"cameras": {"a": {"nickname": "A"}, "b": {"nickname": "B"}}}), &CameraFilter::default());
		}
		let rotation = RotationController::new(state.clone(), Notifier::default(), CADENCE);

		rotation.show().await;
		rotation.show().await;
		assert_eq!(state.read().await.rotation.index(), 0);
	}
}
