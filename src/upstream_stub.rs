use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;



/// Loopback HTTP server answering a single request with `response` verbatim.
/// The handle yields the request head it received.
pub async fn serve_once(response: String) -> (SocketAddr, JoinHandle<String>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind loopback");
	let addr = listener.local_addr().expect("no local address");

	let handle = tokio::spawn(async move {
		let (mut socket, _) = listener.accept().await.expect("failed to accept");
		let mut head = Vec::new();
		let mut buffer = [0u8; 1024];
		while !head.windows(4).any(|window| window == b"\r\n\r\n") {
			let read = socket.read(&mut buffer).await.expect("failed to read request");
			if read == 0 {
				break;
			}
			head.extend_from_slice(&buffer[..read]);
		}
		socket.write_all(response.as_bytes()).await.expect("failed to write response");
		let _ = socket.shutdown().await;
		String::from_utf8_lossy(&head).into_owned()
	});

	(addr, handle)
}

pub fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
	let mut response = format!("HTTP/1.1 {}\r\n", status);
	for (name, value) in headers {
		response.push_str(&format!("{}: {}\r\n", name, value));
	}
	response.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n{}", body.len(), body));
	response
}

/// A loopback address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind loopback");
	listener.local_addr().expect("no local address")
}
