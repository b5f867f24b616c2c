use std::io::{Cursor, Read};
use std::time::Instant;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::error::{EmotionError, Result};
use crate::server::handlers;
use crate::server::state::SharedState;

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A handler's answer, independent of tiny_http so handlers stay testable.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub headers: Vec<(&'static str, String)>,
}

impl Reply {
    pub fn text(status: u16, body: impl Into<String>) -> Reply {
        Reply {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.into().into_bytes(),
            headers: Vec::new(),
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Reply {
        match serde_json::to_vec(value) {
            Ok(body) => Reply { status, content_type: "application/json", body, headers: Vec::new() },
            Err(e) => Reply::text(500, format!("could not encode response: {e}")),
        }
    }

    pub fn empty(status: u16) -> Reply {
        Reply { status, content_type: "text/plain; charset=utf-8", body: Vec::new(), headers: Vec::new() }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Reply {
        self.headers.push((name, value.into()));
        self
    }

    /// Converts into a tiny_http response, adding the CORS origin header
    /// when one is configured.
    pub fn into_response(self, allow_origin: Option<&str>) -> Response<Cursor<Vec<u8>>> {
        let len = self.body.len();
        let mut headers: Vec<Header> = Vec::with_capacity(self.headers.len() + 2);
        headers.extend(header("Content-Type", self.content_type));
        if let Some(origin) = allow_origin {
            headers.extend(header("Access-Control-Allow-Origin", origin));
        }
        for (name, value) in &self.headers {
            headers.extend(header(name, value));
        }
        Response::new(StatusCode(self.status), headers, Cursor::new(self.body), Some(len), None)
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

pub fn not_found() -> Reply {
    Reply::text(404, "404 Not Found")
}

pub fn method_not_allowed(allow: &str) -> Reply {
    Reply::text(405, "405 Method Not Allowed").with_header("Allow", allow)
}

/// Answer to a CORS preflight.
pub fn preflight() -> Reply {
    Reply::empty(204)
        .with_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .with_header("Access-Control-Allow-Headers", "Content-Type")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request and responds to it.
pub fn dispatch(mut request: Request, state: SharedState) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("").to_owned();

    let reply = match (&method, path.as_str()) {
        (Method::Options, "/" | "/predict") => preflight(),

        (Method::Get | Method::Head, "/") => handlers::home::handle(),
        (_, "/") => method_not_allowed("GET, HEAD, OPTIONS"),

        (Method::Post, "/predict") => match read_body(&mut request, state.config.max_body_bytes()) {
            Ok(body) => handlers::predict::handle(&body, &state),
            Err(e) => handlers::predict::failure(&state, &e),
        },
        (_, "/predict") => method_not_allowed("POST, OPTIONS"),

        _ => not_found(),
    };

    let status = reply.status;
    log::info!("{} {} -> {} in {:?}", method, path, status, started.elapsed());

    let response = reply.into_response(state.config.allow_origin());
    if let Err(e) = request.respond(response) {
        log::warn!("Failed to write response for {} {}: {}", method, path, e);
    }
}

/// Reads the request body, refusing anything over `limit` bytes.
fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>> {
    let too_large = || EmotionError::Request(format!("request body exceeds {limit} bytes"));
    if request.body_length().is_some_and(|len| len > limit) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    let mut reader = request.as_reader().take(limit as u64 + 1);
    reader.read_to_end(&mut body)?;
    if body.len() > limit {
        return Err(too_large());
    }
    Ok(body)
}
