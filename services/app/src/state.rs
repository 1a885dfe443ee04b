//! Shared Application State
//!
//! Holds the long-lived services the runtime hands to each spawned command.

use crate::clipboard::Clipboard;
use resonance_core::{debate::DebateService, topic_service::TopicService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub topic_service: Arc<dyn TopicService>,
    pub debate: Arc<DebateService>,
    pub clipboard: Arc<dyn Clipboard>,
}
