use std::sync::Arc;

use crate::config::Config;
use crate::store::RecordStore;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        Self { config, store }
    }
}

pub mod auth_service;
pub mod catalog_service;
pub mod progress_service;
pub mod speech_service;
