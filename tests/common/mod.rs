//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{Signer as _, SigningKey};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use signed_fetcher::app::{ClientConfig, HttpTransport};

/// Minisign-compatible signer with a fixed key
pub struct Signer {
    signing_key: SigningKey,
    key_id: [u8; 8],
}

impl Signer {
    pub fn new(seed: u8) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&[seed; 32]),
            key_id: [seed ^ 0x5a; 8],
        }
    }

    /// Public key in minisign's base64 form
    pub fn public_key(&self) -> String {
        let mut raw = Vec::with_capacity(42);
        raw.extend_from_slice(b"Ed");
        raw.extend_from_slice(&self.key_id);
        raw.extend_from_slice(self.signing_key.verifying_key().as_bytes());
        general_purpose::STANDARD.encode(raw)
    }

    /// Prehashed detached signature file
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(&Blake2b512::digest(payload)).to_bytes();
        let trusted_comment = "timestamp:1718000000\tfile:resolvers.md\thashed";

        let mut line = Vec::with_capacity(74);
        line.extend_from_slice(b"ED");
        line.extend_from_slice(&self.key_id);
        line.extend_from_slice(&signature);

        let mut global = signature.to_vec();
        global.extend_from_slice(trusted_comment.as_bytes());
        let global_signature = self.signing_key.sign(&global).to_bytes();

        format!(
            "untrusted comment: signature from minisign secret key\n{}\ntrusted comment: {}\n{}\n",
            general_purpose::STANDARD.encode(line),
            trusted_comment,
            general_purpose::STANDARD.encode(global_signature)
        )
        .into_bytes()
    }
}

/// HTTP transport with short timeouts for local servers
pub fn transport() -> HttpTransport {
    let config = ClientConfig {
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        rate_limit_rps: 100,
        ..ClientConfig::default()
    };
    HttpTransport::new(&config).unwrap()
}

/// URL on localhost where nothing is listening
pub async fn closed_port_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}{path}")
}

/// Raw server answering every request with a body shorter than its
/// declared length; returns its base URL and the request lines it saw
pub async fn short_body_server(
    declared: usize,
    body: &'static [u8],
) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = vec![0u8; 4096];
            let read = stream.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..read]).to_string();
            if let Some(line) = request.lines().next() {
                log.lock().unwrap().push(line.to_string());
            }

            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {declared}\r\nConnection: close\r\n\r\n"
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(body).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{address}"), seen)
}
