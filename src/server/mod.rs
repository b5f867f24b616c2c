//! HTTP front end: `GET /` liveness and `POST /predict`.
//!
//! Served by a synchronous tiny_http server. Each request is handled on its
//! own thread; the classifier is shared read-only through an `Arc`.

pub mod handlers;
pub mod routes;
pub mod state;
pub mod util;

use std::net::SocketAddr;
use std::sync::Arc;

use tiny_http::Server;

use crate::classify::Classifier;
use crate::config::ServerConfig;
use crate::error::{EmotionError, Result};
use state::{AppState, SharedState};

/// A bound server, ready to accept requests.
pub struct Service {
    server: Server,
    state: SharedState,
}

impl Service {
    /// Binds `config.addr()`. The classifier must already be loaded.
    pub fn bind(config: ServerConfig, classifier: Classifier) -> Result<Service> {
        let server = Server::http(config.addr()).map_err(|e| {
            EmotionError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("could not bind {}: {}", config.addr(), e),
            ))
        })?;
        let state = Arc::new(AppState::new(classifier, config));
        Ok(Service { server, state })
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Accepts requests until the listener closes.
    pub fn run(self) {
        match self.local_addr() {
            Some(addr) => log::info!("Listening on http://{}", addr),
            None => log::info!("Listening on {}", self.state.config.addr()),
        }

        for request in self.server.incoming_requests() {
            let state = self.state.clone();
            std::thread::spawn(move || {
                routes::dispatch(request, state);
            });
        }
    }
}
