//! Error types for session operations.
//!
//! Every variant is recoverable: a failed call leaves the session exactly as
//! it was, and the transport re-displays the current state.

use thiserror::Error;

use crate::effects::Effect;
use crate::raster::RasterError;

/// Errors that can occur while driving an editing session.
#[derive(Error, Debug)]
pub enum EditError {
    /// Upload could not be decoded, or a render could not be encoded.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// A preview or commit was requested before any image was uploaded.
    #[error("no image uploaded yet")]
    NoImage,

    /// A commit was requested with no staged preview (stale or duplicate press).
    #[error("no preview to save")]
    NoPreview,

    /// An effect-scoped call arrived for a menu that is not open.
    #[error("{requested} menu is not open (open: {})", open_menu_name(.active))]
    EffectNotOpen {
        requested: Effect,
        active: Option<Effect>,
    },

    /// A blocking render task panicked or was cancelled.
    #[error("render task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

fn open_menu_name(active: &Option<Effect>) -> String {
    active.map_or_else(|| "none".to_string(), |e| e.to_string())
}

impl EditError {
    /// True for the malformed-upload case the user should be told about
    pub fn is_decode(&self) -> bool {
        matches!(self, EditError::Raster(RasterError::Decode(_)))
    }
}
