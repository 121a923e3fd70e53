use std::sync::Arc;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::response::stream::{Event, EventStream};
use rocket::serde::json::{json, Json, Value};
use rocket::tokio::select;
use rocket::tokio::sync::broadcast::error::RecvError;
use rocket::{Shutdown, State};

use log::{error, info};

use crate::common::Camera;
use crate::config::RelayConfig;
use crate::proxy;
use crate::relay::{ConfigureOutcome, Relay};



#[get("/cameras")]
async fn list_cameras(relay: &State<Arc<Relay>>) -> Json<Vec<Camera>> {
	let state = relay.state().read().await;
	Json(state.registry.roster().to_vec())
}

#[get("/cameras/<nickname>")]
async fn get_camera(nickname: &str, relay: &State<Arc<Relay>>) -> Option<Json<Camera>> {
	let state = relay.state().read().await;
	state.registry.roster().iter().find(|camera| camera.nickname == nickname).map(|camera| {
		Json(camera.clone())
	})
}

#[get("/status")]
async fn status(relay: &State<Arc<Relay>>) -> Value {
	let configured = relay.is_configured().await;
	let state = relay.state().read().await;
	json!({
		"configured": configured,
		"ready": state.rotation.is_ready(),
		"cameras": state.registry.len(),
		"index": state.rotation.index(),
	})
}

#[get("/config")]
async fn get_config(relay: &State<Arc<Relay>>) -> Option<Json<RelayConfig>> {
	relay.config().await.map(Json)
}

#[post("/config", data="<config_json>")]
async fn set_config(config_json: Json<RelayConfig>, relay: &State<Arc<Relay>>) -> Result<Value, Custom<Value>> {
	match relay.configure(config_json.into_inner()).await {
		Ok(ConfigureOutcome::Armed) => {
			info!("Relay configured");
			Ok(json!({ "status": "armed" }))
		},
		Ok(ConfigureOutcome::Refreshed) => Ok(json!({ "status": "refreshed" })),
		Err(err) => {
			error!("Rejected configuration; error was {}", err);
			Err(Custom(Status::UnprocessableEntity, json!({
				"status": "error",
				"reason": err.to_string(),
			})))
		}
	}
}

#[get("/events")]
fn events(relay: &State<Arc<Relay>>, mut end: Shutdown) -> EventStream![] {
	let mut receiver = relay.notifier().subscribe();
	EventStream! {
		loop {
			let notification = select! {
				received = receiver.recv() => match received {
					Ok(notification) => notification,
					Err(RecvError::Closed) => break,
					Err(RecvError::Lagged(_)) => continue,
				},
				_ = &mut end => break,
			};
			yield Event::json(&notification).event(notification.name());
		}
	}
}

#[catch(404)]
fn not_found() -> Value {
	json!({
		"status": "error",
		"reason": "Resource was not found."
	})
}



pub fn stage(relay: Arc<Relay>, module: &str) -> rocket::fairing::AdHoc {
	let base = format!("/{}", module);

	rocket::fairing::AdHoc::on_ignite("Relay API", move |rocket| async move {
		rocket
			.manage(relay)
			.register("/", catchers![not_found])
			.mount(base.as_str(), routes![list_cameras, get_camera, status, get_config, set_config, events])
			.mount(base.as_str(), proxy::routes())
	})
}



#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use rocket::http::{ContentType, Status};
	use rocket::local::asynchronous::Client;
	use serde_json::{json, Value};

	use super::stage;
	use crate::proxy;
	use crate::relay::Relay;

	async fn client() -> Client {
		let relay = Arc::new(Relay::new("MMM-WyzeBridge").expect("relay"));
		let rocket = rocket::build()
			.attach(stage(relay, "MMM-WyzeBridge"))
			.attach(proxy::NoCache);
		Client::tracked(rocket).await.expect("valid rocket instance")
	}

	#[rocket::async_test]
	async fn empty_roster_before_configuration() {
		let client = client().await;

		let response = client.get("/MMM-WyzeBridge/cameras").dispatch().await;
		assert_eq!(response.status(), Status::Ok);
		assert_eq!(response.into_json::<Value>().await, Some(json!([])));

		let response = client.get("/MMM-WyzeBridge/status").dispatch().await;
		assert_eq!(
			response.into_json::<Value>().await,
			Some(json!({"configured": false, "ready": false, "cameras": 0, "index": 0}))
		);

		let response = client.get("/MMM-WyzeBridge/config").dispatch().await;
		assert_eq!(response.status(), Status::NotFound);
	}

	#[rocket::async_test]
	async fn proxy_is_unavailable_until_configured() {
		let client = client().await;

		let response = client.get("/MMM-WyzeBridge/proxy/cameras").dispatch().await;
		assert_eq!(response.status(), Status::ServiceUnavailable);
		assert_eq!(
			response.headers().get_one("Cache-Control"),
			Some("no-store, no-cache, must-revalidate, proxy-revalidate")
		);
		assert_eq!(response.headers().get_one("Expires"), Some("0"));

		let response = client.get("/MMM-WyzeBridge/stream/front/stream.m3u8").dispatch().await;
		assert_eq!(response.status(), Status::ServiceUnavailable);
	}

	#[rocket::async_test]
	async fn invalid_configuration_is_rejected() {
		let client = client().await;

		let response = client.post("/MMM-WyzeBridge/config")
			.header(ContentType::JSON)
			.body(r#"{"targetPort": 5000}"#)
			.dispatch()
			.await;
		assert_eq!(response.status(), Status::UnprocessableEntity);
		let body = response.into_json::<Value>().await.expect("json body");
		assert_eq!(body["status"], json!("error"));
		assert!(body["reason"].as_str().expect("reason").contains("targetHost"));
	}

	#[rocket::async_test]
	async fn unknown_paths_get_json_404() {
		let client = client().await;

		let response = client.get("/MMM-WyzeBridge/cameras/Nowhere").dispatch().await;
		assert_eq!(response.status(), Status::NotFound);
		assert!(response.headers().get_one("Cache-Control").is_none());

		let response = client.get("/elsewhere").dispatch().await;
		assert_eq!(response.status(), Status::NotFound);
		let body = response.into_json::<Value>().await.expect("json body");
		assert_eq!(body["reason"], json!("Resource was not found."));
	}
}
