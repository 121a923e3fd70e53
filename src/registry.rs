use std::collections::HashSet;
use std::sync::Arc;

use log::{info, warn};

use crate::common::{Camera, RawRoster, Roster};
use crate::filter::CameraFilter;



#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterDiff {
	pub added: Vec<String>,
	pub removed: Vec<String>,
}

impl RosterDiff {
	pub fn between(old: &[Camera], new: &[Camera]) -> RosterDiff {
		let old_names: HashSet<&str> = old.iter().map(|camera| camera.nickname.as_str()).collect();
		let new_names: HashSet<&str> = new.iter().map(|camera| camera.nickname.as_str()).collect();

		RosterDiff {
			added: new.iter()
				.filter(|camera| !old_names.contains(camera.nickname.as_str()))
				.map(|camera| camera.nickname.clone())
				.collect(),
			removed: old.iter()
				.filter(|camera| !new_names.contains(camera.nickname.as_str()))
				.map(|camera| camera.nickname.clone())
				.collect(),
		}
	}

	pub fn is_significant(&self) -> bool {
		self.added.len() + self.removed.len() > 0
	}
}

/// Turns a raw upstream payload into a filtered roster sorted by nickname.
/// Anything that is not an object with a `cameras` object counts as no cameras.
pub fn build_roster(raw: &RawRoster, filter: &CameraFilter) -> Vec<Camera> {
	let Some(entries) = raw.get("cameras").and_then(|cameras| cameras.as_object()) else {
		return Vec::new();
	};

	let mut cameras: Vec<Camera> = Vec::with_capacity(entries.len());
	for (key, value) in entries {
		if !filter.includes(key) {
			continue;
		}
		match value.as_object() {
			Some(record) => cameras.push(Camera::from_raw(key, record)),
			None => warn!("Ignoring camera {} with malformed record", key),
		}
	}

	cameras.sort_by(|a, b| a.nickname.cmp(&b.nickname));
	cameras.dedup_by(|later, earlier| {
		let duplicate = later.nickname == earlier.nickname;
		if duplicate {
			warn!("Ignoring duplicate camera nickname {}", later.nickname);
		}
		duplicate
	});
	cameras
}

pub struct CameraRegistry {
	roster: Roster,
}

impl CameraRegistry {
	pub fn new() -> CameraRegistry {
		CameraRegistry { roster: Arc::new(Vec::new()) }
	}

	pub fn roster(&self) -> &Roster {
		&self.roster
	}

	pub fn len(&self) -> usize {
		self.roster.len()
	}

	pub fn get(&self, index: usize) -> Option<&Camera> {
		self.roster.get(index)
	}

	pub fn absorb(&mut self, raw: &RawRoster, filter: &CameraFilter) -> RosterDiff {
		self.replace(build_roster(raw, filter))
	}

	/// Swaps in `cameras` only when the set of nicknames changed, so an unchanged
	/// roster keeps the same `Arc` and consumers see no update.
	pub fn replace(&mut self, cameras: Vec<Camera>) -> RosterDiff {
		let diff = RosterDiff::between(&self.roster, &cameras);
		if diff.is_significant() {
			info!("Changes received in cameras");
			self.roster = Arc::new(cameras);
			for name in &diff.added {
				info!("{} camera detected", name);
			}
			for name in &diff.removed {
				info!("{} camera removed", name);
			}
		}
		diff
	}

	pub fn clear(&mut self) -> RosterDiff {
		self.replace(Vec::new())
	}
}

impl Default for CameraRegistry {
	fn default() -> Self {
		CameraRegistry::new()
	}
}
