#[macro_use] extern crate rocket;
#[macro_use] extern crate serde_derive;

use std::sync::Arc;

use clap::{Command, Arg, ArgAction};
use log::{error, info};
use rocket::{Request, Response};
use rocket::fairing::{AdHoc, Fairing, Info, Kind};
use rocket::http::Header;

use crate::config::RelayConfig;
use crate::relay::Relay;

mod common;
mod config;
mod error;
mod filter;
mod notify;
mod poller;
mod proxy;
mod registry;
mod relay;
mod rest_api;
mod rotation;
mod schedule;
mod state;
#[cfg(test)]
mod upstream_stub;



// The display client may be served by another server, so it needs CORS to reach the relay.
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
	fn info(&self) -> Info {
		Info {
			name: "Add CORS headers to responses",
			kind: Kind::Response
		}
	}

	async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
		response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
		response.set_header(Header::new("Access-Control-Allow-Methods", "POST, GET, PATCH, OPTIONS"));
		response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
		response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
	}
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
	let matches = Command::new("clustervms-wyze-relay")
		.version("0.0.4")
		.author("Alicrow")
		.about("Relays a wyze-bridge camera roster and streams to a display client.")
		.arg(
			Arg::new("config")
				.action(ArgAction::Append)	// Allow argument to be specified multiple times
				.short('c')
				.long("config")
				.help("TOML file with relay config, applied as the client's SET_CONFIG at startup")
		)
		.arg(
			Arg::new("module")
				.short('m')
				.long("module")
				.default_value("MMM-WyzeBridge")
				.help("Module name, used as the URL base for every route")
		)
		.get_matches();

	let module = matches.get_one::<String>("module").cloned().unwrap_or_default();
	let startup_config = match matches.get_many::<String>("config") {
		Some(filenames) => {
			let filenames: Vec<&String> = filenames.collect();
			Some(RelayConfig::read_files(&filenames).await?)
		},
		None => {
			// Wait for the display client to send its configuration
			None
		}
	};

	let relay = Arc::new(Relay::new(&module)?);
	let startup_relay = relay.clone();

	rocket::build()
		.attach(rest_api::stage(relay, &module))
		.attach(CORS)
		.attach(proxy::NoCache)
		.attach(AdHoc::on_liftoff("Startup config", move |_| Box::pin(async move {
			let Some(config) = startup_config else {
				info!("Waiting for SET_CONFIG from the display client");
				return;
			};
			if let Err(err) = startup_relay.configure(config).await {
				error!("Startup config rejected; error was {}", err);
			}
		})))
		.attach(AdHoc::on_shutdown("Stop relay loops", |rocket| Box::pin(async move {
			if let Some(relay) = rocket.state::<Arc<Relay>>() {
				relay.shutdown().await;
			}
		})))
		.launch()
		.await?;

	anyhow::Ok(())
}
