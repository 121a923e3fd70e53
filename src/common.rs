use std::sync::Arc;

use serde_json::Value;



pub type Roster = Arc<Vec<Camera>>;

pub type RawRoster = Value;

#[derive(Clone)]
#[derive(Debug, PartialEq)]
#[derive(Serialize)]
pub struct Camera {
	pub nickname: String,
	pub name_uri: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub connected: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub firmware_ver: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product_model: Option<Value>,
	pub image_url: String,
	pub video_url: String,
}

impl Camera {
	/// Builds a camera from one upstream record. `key` is the upstream identifier,
	/// used when the record lacks a nickname or a name_uri.
	pub fn from_raw(key: &str, raw: &serde_json::Map<String, Value>) -> Camera {
		let text = |field: &str| {
			raw.get(field)
				.and_then(Value::as_str)
				.map(str::to_string)
				.unwrap_or_else(|| key.to_string())
		};
		let attribute = |field: &str| raw.get(field).cloned();

		let name_uri = text("name_uri");
		let snapshot = raw.get("snapshot_url").and_then(Value::as_str).unwrap_or("");

		Camera {
			nickname: text("nickname"),
			status: attribute("status"),
			connected: attribute("connected"),
			enabled: attribute("enabled"),
			firmware_ver: attribute("firmware_ver"),
			product_model: attribute("product_model"),
			image_url: format!("/{}/{}", PROXY_NAMESPACE, snapshot.trim_start_matches('/')),
			video_url: format!("/{}/{}/stream.m3u8", STREAM_NAMESPACE, name_uri),
			name_uri,
		}
	}
}

pub const PROXY_NAMESPACE: &str = "proxy";
pub const STREAM_NAMESPACE: &str = "stream";
