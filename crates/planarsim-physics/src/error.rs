//! Error types for scene loading and simulation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or driving a scene.
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// Scene file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Scene file is not a valid scene document.
    #[error("Malformed scene file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Simulation configuration could not be parsed.
    #[error("Invalid simulation config: {0}")]
    Config(String),

    /// A shape is present but its fields are invalid.
    #[error("Malformed shape on body {body:?}, fixture {fixture}: {reason}")]
    MalformedShape {
        /// Owning body name.
        body: String,
        /// Fixture position within the body.
        fixture: usize,
        /// Reason for failure.
        reason: String,
    },

    /// Two bodies share a name.
    #[error("Duplicate body name: {0}")]
    DuplicateBodyName(String),

    /// Two joints share a name.
    #[error("Duplicate joint name: {0}")]
    DuplicateJointName(String),

    /// A joint refers to a body that does not exist.
    #[error("Joint {joint:?} refers to unknown {reference}")]
    UnknownBodyReference {
        /// Joint name.
        joint: String,
        /// The reference as written in the file.
        reference: String,
    },

    /// A joint declares a kind that is not supported.
    #[error("Joint {joint:?} has unsupported type {kind:?}")]
    UnsupportedJointKind {
        /// Joint name.
        joint: String,
        /// The kind tag as written in the file.
        kind: String,
    },

    /// No joint with this name exists.
    #[error("Joint not found: {0}")]
    UnknownJoint(String),

    /// No body with this name exists.
    #[error("Body not found: {0}")]
    UnknownBody(String),

    /// The joint has no angle or angular motor to actuate.
    #[error("Joint {joint:?} of type {kind} cannot be actuated")]
    NotActuatable {
        /// Joint name.
        joint: String,
        /// Joint kind.
        kind: &'static str,
    },
}
