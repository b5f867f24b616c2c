use std::sync::Arc;

use crate::classify::Classifier;
use crate::config::ServerConfig;

/// Everything a request handler needs. Built once before the server starts
/// and never mutated afterwards, so it is shared without a lock.
#[derive(Debug)]
pub struct AppState {
    pub classifier: Classifier,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(classifier: Classifier, config: ServerConfig) -> Self {
        AppState { classifier, config }
    }

    /// Status code for a failed prediction: always 200 unless strict mode
    /// is on, in which case caller mistakes are 400 and the rest 500.
    pub fn error_status(&self, client_error: bool) -> u16 {
        match (self.config.strict_status(), client_error) {
            (false, _) => 200,
            (true, true) => 400,
            (true, false) => 500,
        }
    }
}

/// Shared state type passed to every handler thread.
pub type SharedState = Arc<AppState>;
