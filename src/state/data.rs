/// Shared data structures for session state
///
/// These structs are what flows from the session engine back to the
/// transport layer, which turns them into captions and buttons.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::effects::Effect;
use crate::raster::EncodedImage;

/// Identifies one user's editing session (a chat/conversation ID)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        SessionId(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Preview/commit state machine position
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Main menu, no effect open
    Closed,
    /// Effect menu open, no preview for the current parameter
    Adjusting,
    /// Preview shown, next press saves it
    Previewing,
}

/// What an open effect menu should display
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectView {
    pub effect: Effect,
    pub parameter: i32,
    pub stage: Stage,
}

impl EffectView {
    pub fn is_previewing(&self) -> bool {
        self.stage == Stage::Previewing
    }
}

impl fmt::Display for EffectView {
    /// Caption text, e.g. `Brightness: 20 (unsaved)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.effect, self.parameter)?;
        if self.is_previewing() {
            f.write_str(" (preview)")
        } else if self.parameter != self.effect.default_parameter() {
            f.write_str(" (unsaved)")
        } else {
            Ok(())
        }
    }
}

/// Result of pressing the Preview/Save button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOutcome {
    /// `Previewing` after a render, `Closed` after a save
    pub stage: Stage,
    /// The staged preview, or the newly committed image after a save
    pub image: Option<EncodedImage>,
}

/// Result of an undo or redo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryOutcome {
    /// False when there was nothing to undo/redo
    pub applied: bool,
    /// The now-current image, only when `applied`
    pub image: Option<EncodedImage>,
    pub can_undo: bool,
    pub can_redo: bool,
}
