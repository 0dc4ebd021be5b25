//! Block server
//!
//! Exposes the block facade to the visual programming environment over
//! TCP. The editor polls `GET /poll` for all reporter and predicate
//! values (`name value` lines) and issues command blocks as
//! `GET /<name>/<arg>/...` with percent-encoded arguments. `GET /`
//! serves the block descriptor as JSON.

use crate::domain::blocks::{BlockFacade, BlockKind, BLOCKS};
use crate::infrastructure::bluetooth::profile;
use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

pub const EXTENSION_NAME: &str = "Simple micro:bit Extension";

/// Flash-era editors fetch this before anything else.
const CROSSDOMAIN_POLICY: &str = "<cross-domain-policy>\
<allow-access-from domain=\"*\" to-ports=\"*\"/>\
</cross-domain-policy>\0";

pub struct BlockServer {
    facade: Arc<BlockFacade>,
    port: u16,
}

impl BlockServer {
    pub fn new(facade: Arc<BlockFacade>, port: u16) -> Self {
        Self { facade, port }
    }

    /// Accept loop. Individual client errors are logged and never take
    /// the server down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .await
            .with_context(|| format!("binding block server to port {}", self.port))?;
        info!("Block server listening on port {}", self.port);

        loop {
            let (stream, peer) = listener.accept().await?;
            let facade = self.facade.clone();
            let port = self.port;
            tokio::spawn(async move {
                if let Err(err) = handle_client(stream, facade, port).await {
                    debug!(%peer, %err, "client connection ended");
                }
            });
        }
    }
}

/// Serve GET requests on one connection until the peer hangs up.
async fn handle_client(stream: TcpStream, facade: Arc<BlockFacade>, port: u16) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let Some(path) = parse_request_line(&line) else {
            warn!(request = line.trim(), "ignoring malformed request");
            return Ok(());
        };

        // Drain headers up to the blank line; we route on the path only.
        let mut header = String::new();
        loop {
            header.clear();
            if reader.read_line(&mut header).await? == 0 {
                return Ok(());
            }
            if header == "\r\n" || header == "\n" {
                break;
            }
        }

        let response = route(&facade, &path, port);
        write_half.write_all(response.as_bytes()).await?;
    }
}

/// Pull the path out of a `GET <path> HTTP/1.x` request line.
fn parse_request_line(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    Some(parts.next()?.to_string())
}

/// Map a request path to a full HTTP response.
fn route(facade: &BlockFacade, path: &str, port: u16) -> String {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        .collect();

    match segments.first().map(String::as_str) {
        None => ok("application/json", &descriptor(port).to_string()),
        Some("crossdomain.xml") => ok("text/xml", CROSSDOMAIN_POLICY),
        Some("poll") => ok("text/plain", &poll_body(facade)),
        Some("reset_all") => {
            facade.reset();
            ok("text/plain", "")
        }
        Some(name) => {
            if facade.invoke(name, &segments[1..]) {
                ok("text/plain", "")
            } else {
                response("404 Not Found", "text/plain", "unknown block\n")
            }
        }
    }
}

/// All reporter and predicate values as `name value` lines.
fn poll_body(facade: &BlockFacade) -> String {
    facade
        .poll()
        .into_iter()
        .map(|(name, value)| format!("{name} {value}\n"))
        .collect()
}

/// The extension descriptor: blocks plus the out-of-band menus for
/// menu-constrained command parameters.
fn descriptor(port: u16) -> serde_json::Value {
    let blocks: Vec<_> = BLOCKS
        .iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "label": spec.label,
                "kind": match spec.kind {
                    BlockKind::Reporter => "reporter",
                    BlockKind::Predicate => "predicate",
                    BlockKind::Command => "command",
                },
            })
        })
        .collect();
    let patterns: Vec<_> = profile::LED_MATRIX_PATTERNS
        .iter()
        .map(|(name, _)| *name)
        .collect();

    json!({
        "name": EXTENSION_NAME,
        "port": port,
        "blocks": blocks,
        "menus": {
            "matrix_pattern": patterns,
            "matrix_row": (0..32).collect::<Vec<u8>>(),
            "clear_type": { "0": "on", "1": "off" },
        },
    })
}

fn ok(content_type: &str, body: &str) -> String {
    response("200 OK", content_type, body)
}

fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\n\r\n{body}",
        body.len()
    )
}
