//! Outcome - Result of a quicksave operation, ready for display

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Type of operation performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Save,
    Load,
    Screen,
    Exists,
    List,
    Path,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Save => write!(f, "save"),
            Operation::Load => write!(f, "load"),
            Operation::Screen => write!(f, "screen"),
            Operation::Exists => write!(f, "exists"),
            Operation::List => write!(f, "list"),
            Operation::Path => write!(f, "path"),
        }
    }
}

/// Result of a quicksave operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub details: HashMap<String, serde_json::Value>,
}

impl Outcome {
    /// Create a new Outcome
    pub fn new(
        operation: Operation,
        slot: Option<u8>,
        success: bool,
        message: Option<String>,
    ) -> Self {
        Self {
            operation,
            slot,
            success,
            message,
            details: HashMap::new(),
        }
    }

    /// Outcome of a slot operation that did something
    pub fn done(operation: Operation, slot: u8, message: String) -> Self {
        Self::new(operation, Some(slot), true, Some(message))
    }

    /// Outcome of a slot operation that had nothing to do
    pub fn skipped(operation: Operation, slot: u8) -> Self {
        let mut outcome = Self::new(operation, Some(slot), true, None);
        outcome.add_detail("skipped".to_string(), serde_json::json!(true));
        outcome
    }

    /// Whether the operation was a no-op
    pub fn is_skipped(&self) -> bool {
        self.get_detail("skipped") == Some(&serde_json::json!(true))
    }

    /// Check if the operation succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Record the file the operation touched
    pub fn with_path(mut self, path: &Path) -> Self {
        self.add_detail(
            "path".to_string(),
            serde_json::json!(path.to_string_lossy()),
        );
        self
    }

    /// Add a detail field
    pub fn add_detail(&mut self, key: String, value: serde_json::Value) {
        self.details.insert(key, value);
    }

    /// Get a detail field
    pub fn get_detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }
}
