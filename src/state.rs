// src/state.rs
use std::sync::Arc;

use crate::database::ConnectionManager;

#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(connections: ConnectionManager) -> Self {
        Self { connections: Arc::new(connections) }
    }
}
