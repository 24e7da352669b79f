//! Error handling for Rigprep
//!
//! The two abort conditions of the export flow carry fixed dialog text;
//! everything else is host or I/O failure that terminates the run.

use thiserror::Error;

/// Result type alias for Rigprep operations
pub type Result<T> = std::result::Result<T, RigprepError>;

/// Main error type for Rigprep operations
#[derive(Error, Debug)]
pub enum RigprepError {
    // Preflight Errors
    #[error("document has unsaved changes")]
    UnsavedChanges,

    #[error("duplicate top-level layer name: {name}")]
    DuplicateTopLevelNames { name: String },

    #[error("document has no backing file; save it before exporting")]
    MissingBackingFile,

    // Document Tree Errors
    #[error("stale node id: slot {slot} generation {generation}")]
    StaleNode { slot: u32, generation: u32 },

    #[error("node has no parent")]
    NoParent,

    #[error("no active node selected")]
    NoActiveNode,

    #[error("invalid tree operation: {reason}")]
    InvalidTreeOp { reason: String },

    // Host Errors
    #[error("host refused action: {reason}")]
    HostRefused { reason: String },

    #[error("export failed for layer '{layer}': {reason}")]
    ExportFailed { layer: String, reason: String },

    // File Format Errors
    #[error("unsupported document schema version: {version}")]
    UnsupportedSchema { version: String },

    #[error("not a rigprep document: {path}")]
    InvalidDocument { path: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RigprepError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            RigprepError::UnsavedChanges => "UNSAVED_CHANGES",
            RigprepError::DuplicateTopLevelNames { .. } => "DUPLICATE_TOP_LEVEL_NAMES",
            RigprepError::MissingBackingFile => "MISSING_BACKING_FILE",
            RigprepError::StaleNode { .. } => "STALE_NODE",
            RigprepError::NoParent => "NO_PARENT",
            RigprepError::NoActiveNode => "NO_ACTIVE_NODE",
            RigprepError::InvalidTreeOp { .. } => "INVALID_TREE_OP",
            RigprepError::HostRefused { .. } => "HOST_REFUSED",
            RigprepError::ExportFailed { .. } => "EXPORT_FAILED",
            RigprepError::UnsupportedSchema { .. } => "UNSUPPORTED_SCHEMA",
            RigprepError::InvalidDocument { .. } => "INVALID_DOCUMENT",
            RigprepError::Io(_) => "IO_ERROR",
            RigprepError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error is one of the preflight aborts shown to the user
    /// as a modal dialog rather than a raw failure.
    pub fn is_user_abort(&self) -> bool {
        matches!(
            self,
            RigprepError::UnsavedChanges
                | RigprepError::DuplicateTopLevelNames { .. }
                | RigprepError::MissingBackingFile
        )
    }

    /// Get the dialog message for this error
    ///
    /// Preflight aborts use the fixed wording the add-on always showed;
    /// other errors fall back to their display form.
    pub fn dialog_message(&self) -> String {
        match self {
            RigprepError::UnsavedChanges => {
                "Current document has unsaved changes. Aborting operation.".to_string()
            }
            RigprepError::DuplicateTopLevelNames { .. } => {
                "There are multiple top-level layers that share a name. Aborting operation."
                    .to_string()
            }
            RigprepError::MissingBackingFile => {
                "Current document has never been saved. Aborting operation.".to_string()
            }
            _ => self.to_string(),
        }
    }
}
