use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use log::{debug, error};
use rocket::data::{Data, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Method, Status};
use rocket::response::{self, status::Custom, Responder, Response};
use rocket::route::{Handler, Outcome, Route};
use rocket::serde::json::{json, Value};
use rocket::Request;
use url::Url;

use crate::common::{PROXY_NAMESPACE, STREAM_NAMESPACE};
use crate::error::Result;
use crate::relay::Relay;



/// The bridge always serves HLS on this port, whatever its API port is.
pub const STREAM_PORT: u16 = 8888;

const MAX_BODY_MIB: usize = 16;

const METHODS: [Method; 7] = [Method::Get, Method::Head, Method::Post, Method::Put, Method::Patch, Method::Delete, Method::Options];

const HOP_BY_HOP: [&str; 9] = [
	"connection", "content-length", "host", "keep-alive", "proxy-authenticate",
	"proxy-authorization", "te", "trailer", "transfer-encoding",
];

const CACHE_HEADERS: [&str; 6] = ["cache-control", "etag", "expires", "last-modified", "pragma", "surrogate-control"];

#[derive(Clone, Debug, PartialEq)]
pub struct ProxyTargets {
	pub api: Url,
	pub stream: Url,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Namespace {
	Api,
	Stream,
}

impl Namespace {
	pub fn segment(&self) -> &'static str {
		match self {
			Namespace::Api => PROXY_NAMESPACE,
			Namespace::Stream => STREAM_NAMESPACE,
		}
	}
}

fn forwardable_request_header(name: &str) -> bool {
	!HOP_BY_HOP.iter().any(|skip| name.eq_ignore_ascii_case(skip))
}

fn forwardable_response_header(name: &str) -> bool {
	forwardable_request_header(name) && !CACHE_HEADERS.iter().any(|skip| name.eq_ignore_ascii_case(skip))
}

/// Rewrites `/<module>/proxy/*` and `/<module>/stream/*` onto the bridge.
/// Targets are set once, when the relay receives its configuration.
pub struct ProxyRouter {
	module: String,
	targets: OnceLock<ProxyTargets>,
	client: reqwest::Client,
}

impl ProxyRouter {
	pub fn new(module: &str) -> Result<ProxyRouter> {
		let client = reqwest::Client::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(ProxyRouter {
			module: module.to_string(),
			targets: OnceLock::new(),
			client,
		})
	}

	/// Returns false when the router was already armed; targets never change afterwards.
	pub fn arm(&self, targets: ProxyTargets) -> bool {
		self.targets.set(targets).is_ok()
	}

	pub fn targets(&self) -> Option<&ProxyTargets> {
		self.targets.get()
	}

	pub fn prefix(&self, namespace: Namespace) -> String {
		format!("/{}/{}/", self.module, namespace.segment())
	}

	pub fn namespace_of(&self, path: &str) -> Option<Namespace> {
		[Namespace::Api, Namespace::Stream]
			.into_iter()
			.find(|namespace| path.starts_with(&self.prefix(*namespace)))
	}

	/// Upstream URL for an inbound request, or None when unarmed or outside `namespace`.
	pub fn resolve(&self, namespace: Namespace, path: &str, query: Option<&str>) -> Option<Url> {
		let targets = self.targets()?;
		let rest = path.strip_prefix(&self.prefix(namespace))?;

		let mut url = match namespace {
			Namespace::Api => targets.api.clone(),
			Namespace::Stream => targets.stream.clone(),
		};
		let base = url.path().trim_end_matches('/').to_string();
		url.set_path(&format!("{}/{}", base, rest));
		url.set_query(query);
		Some(url)
	}

	pub async fn forward(&self, method: reqwest::Method, url: Url, headers: Vec<(String, String)>, body: Vec<u8>) -> Result<ProxiedResponse> {
		debug!("Forwarding {} {}", method, url);
		let mut request = self.client.request(method, url);
		for (name, value) in headers {
			request = request.header(name, value);
		}
		let upstream = request.body(body).send().await?;

		let status = upstream.status().as_u16();
		let headers = upstream.headers().iter()
			.filter(|(name, _)| forwardable_response_header(name.as_str()))
			.filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string())))
			.collect();
		let body = upstream.bytes().await?.to_vec();

		Ok(ProxiedResponse { status, headers, body })
	}
}

#[derive(Debug)]
pub struct ProxiedResponse {
	pub status: u16,
	pub headers: Vec<(String, String)>,
	pub body: Vec<u8>,
}

impl<'r> Responder<'r, 'static> for ProxiedResponse {
	fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
		let mut builder = Response::build();
		builder.status(Status::new(self.status));
		for (name, value) in self.headers {
			builder.raw_header_adjoin(name, value);
		}
		builder.sized_body(self.body.len(), Cursor::new(self.body));
		builder.ok()
	}
}

fn proxy_error(status: Status, reason: String) -> Custom<Value> {
	Custom(status, json!({
		"status": "error",
		"reason": reason,
	}))
}

#[derive(Clone)]
pub struct ProxyHandler(Namespace);

#[rocket::async_trait]
impl Handler for ProxyHandler {
	async fn handle<'r>(&self, req: &'r Request<'_>, data: Data<'r>) -> Outcome<'r> {
		let Some(relay) = req.rocket().state::<Arc<Relay>>() else {
			return Outcome::from(req, Status::InternalServerError);
		};
		let router = relay.proxy();

		let path = req.uri().path();
		let query = req.uri().query();
		if router.targets().is_none() {
			return Outcome::from(req, proxy_error(Status::ServiceUnavailable, "Relay has not been configured yet".to_string()));
		}
		let Some(url) = router.resolve(self.0, path.as_str(), query.as_ref().map(|query| query.as_str())) else {
			return Outcome::from(req, Status::NotFound);
		};

		let Ok(method) = reqwest::Method::from_bytes(req.method().as_str().as_bytes()) else {
			return Outcome::from(req, Status::MethodNotAllowed);
		};
		let headers = req.headers().iter()
			.filter(|header| forwardable_request_header(header.name().as_str()))
			.map(|header| (header.name().as_str().to_string(), header.value().to_string()))
			.collect();
		let body = match data.open(MAX_BODY_MIB.mebibytes()).into_bytes().await {
			Ok(body) if body.is_complete() => body.into_inner(),
			Ok(_) => {
				let reason = format!("Request body exceeds {} MiB", MAX_BODY_MIB);
				return Outcome::from(req, proxy_error(Status::PayloadTooLarge, reason));
			},
			Err(err) => return Outcome::from(req, proxy_error(Status::BadRequest, err.to_string())),
		};

		match router.forward(method, url.clone(), headers, body).await {
			Ok(response) => Outcome::from(req, response),
			Err(err) => {
				error!("Proxying {} failed; error was {}", url, err);
				Outcome::from(req, proxy_error(Status::BadGateway, err.to_string()))
			}
		}
	}
}

// Snapshots and stream manifests change constantly; nothing under the proxy prefixes may be cached.
pub struct NoCache;

#[rocket::async_trait]
impl Fairing for NoCache {
	fn info(&self) -> Info {
		Info {
			name: "Disable caching of proxied responses",
			kind: Kind::Response
		}
	}

	async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
		let Some(relay) = request.rocket().state::<Arc<Relay>>() else {
			return;
		};
		if relay.proxy().namespace_of(request.uri().path().as_str()).is_none() {
			return;
		}
		response.remove_header("ETag");
		response.remove_header("Last-Modified");
		response.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, proxy-revalidate"));
		response.set_header(Header::new("Pragma", "no-cache"));
		response.set_header(Header::new("Expires", "0"));
		response.set_header(Header::new("Surrogate-Control", "no-store"));
	}
}

pub fn routes() -> Vec<Route> {
	let mut routes = Vec::new();
	for namespace in [Namespace::Api, Namespace::Stream] {
		let uri = format!("/{}/<path..>", namespace.segment());
		for method in METHODS {
			routes.push(Route::new(method, &uri, ProxyHandler(namespace)));
		}
	}
	routes
}
