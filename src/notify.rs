use tokio::sync::broadcast;

use crate::common::Camera;



/// Display-state codes; the client translates them into text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayMessage {
	Loading,
	NoCams,
}

#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize)]
#[serde(tag = "notification", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
	SetMessage(DisplayMessage),
	SetCamera(Camera),
	ReadyState(bool),
	CamerasUpdated(usize),
}

impl Notification {
	pub fn name(&self) -> &'static str {
		match self {
			Notification::SetMessage(_) => "SET_MESSAGE",
			Notification::SetCamera(_) => "SET_CAMERA",
			Notification::ReadyState(_) => "READY_STATE",
			Notification::CamerasUpdated(_) => "CAMERAS_UPDATED",
		}
	}
}

#[derive(Clone)]
pub struct Notifier {
	sender: broadcast::Sender<Notification>,
}

impl Notifier {
	pub fn new(capacity: usize) -> Notifier {
		let (sender, _) = broadcast::channel(capacity);
		Notifier { sender }
	}

	/// Sends to whoever is listening; with no display client attached the event is dropped.
	pub fn send(&self, notification: Notification) {
		let _ = self.sender.send(notification);
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
		self.sender.subscribe()
	}
}

impl Default for Notifier {
	fn default() -> Self {
		Notifier::new(64)
	}
}
