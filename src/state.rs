use crate::common::RawRoster;
use crate::filter::CameraFilter;
use crate::notify::{DisplayMessage, Notification};
use crate::registry::{CameraRegistry, RosterDiff};



#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationState {
	index: usize,
	ready: bool,
}

impl RotationState {
	pub fn index(&self) -> usize {
		self.index
	}

	pub fn is_ready(&self) -> bool {
		self.ready
	}

	/// Readiness never goes back to false.
	pub fn mark_ready(&mut self) {
		self.ready = true;
	}

	pub fn clamp(&mut self, len: usize) {
		if self.index >= len {
			self.index = 0;
		}
	}

	pub fn advance(&mut self, len: usize) {
		if self.ready && len > 0 {
			self.index = (self.index + 1) % len;
		}
	}
}

#[derive(Default)]
pub struct RelayState {
	pub registry: CameraRegistry,
	pub rotation: RotationState,
}

impl RelayState {
	pub fn new() -> RelayState {
		RelayState::default()
	}

	pub fn absorb(&mut self, raw: &RawRoster, filter: &CameraFilter) -> RosterDiff {
		let diff = self.registry.absorb(raw, filter);
		self.rotation.clamp(self.registry.len());
		diff
	}

	pub fn clear_roster(&mut self) -> RosterDiff {
		let diff = self.registry.clear();
		self.rotation.clamp(self.registry.len());
		diff
	}

	/// What the display client should show right now.
	pub fn display(&mut self) -> Notification {
		self.rotation.clamp(self.registry.len());
		if !self.rotation.is_ready() {
			return Notification::SetMessage(DisplayMessage::Loading);
		}
		match self.registry.get(self.rotation.index()) {
			Some(camera) => Notification::SetCamera(camera.clone()),
			None => Notification::SetMessage(DisplayMessage::NoCams),
		}
	}

	pub fn advance(&mut self) {
		self.rotation.advance(self.registry.len());
	}
}
