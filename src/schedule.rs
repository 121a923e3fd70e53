use std::future::Future;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;



#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
	pub update_interval: Duration,
	pub retry_delay: Duration,
}

impl Cadence {
	pub fn next(&self, ready: bool) -> Duration {
		if ready { self.update_interval } else { self.retry_delay }
	}
}

pub struct ScheduledTask {
	name: &'static str,
	handle: JoinHandle<()>,
}

impl ScheduledTask {
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn cancel(&self) {
		debug!("Cancelling {} task", self.name);
		self.handle.abort();
	}
}

/// Runs `step` and sleeps for the delay it returns, forever.
/// The next run is only armed once the previous one has completed, so runs never overlap.
pub fn spawn_rearming<F, Fut>(name: &'static str, mut step: F) -> ScheduledTask
where
	F: FnMut() -> Fut + Send + 'static,
	Fut: Future<Output = Duration> + Send + 'static,
{
	let handle = tokio::spawn(async move {
		loop {
			let delay = step().await;
			tokio::time::sleep(delay).await;
		}
	});

	ScheduledTask { name, handle }
}
