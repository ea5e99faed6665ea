//! Server configuration.

use coscribe_engine::SequencerConfig;

/// Configuration for the collaboration server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Capacity of each session's bounded outbound queue. A session
    /// whose queue overflows is disconnected rather than buffered
    /// without bound.
    pub queue_capacity: usize,
    /// Display name given to documents created on first connect.
    pub default_doc_name: String,
    /// Maximum per-document history retained for transformation.
    pub max_history: usize,
}

impl ServerConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self {
            queue_capacity: 256,
            default_doc_name: "untitled".to_string(),
            max_history: 4096,
        }
    }

    /// Sets the per-session outbound queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the display name for newly created documents.
    pub fn with_default_doc_name(mut self, name: impl Into<String>) -> Self {
        self.default_doc_name = name.into();
        self
    }

    /// Sets the maximum retained per-document history.
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// The sequencer configuration derived from this one.
    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig::new().with_max_history(self.max_history)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.default_doc_name, "untitled");
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new()
            .with_queue_capacity(8)
            .with_default_doc_name("scratch")
            .with_max_history(64);

        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.default_doc_name, "scratch");
        assert_eq!(config.sequencer_config().max_history, 64);
    }
}
