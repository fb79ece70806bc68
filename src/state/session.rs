//! One user's editing session and its preview/commit state machine.
//!
//! ```text
//!            open_effect
//!   Closed ──────────────▶ Adjusting ◀─────────────┐
//!     ▲                     │    ▲                 │ adjust_parameter
//!     │ commit / discard    │    │ adjust_parameter│
//!     │                     ▼    │                 │
//!     └──────────────── Previewing ────────────────┘
//!                 (request_preview renders)
//! ```
//!
//! The same machine drives every effect; the effect's [`EffectSpec`] supplies
//! the default parameter, its bounds, and the transform.
//!
//! [`EffectSpec`]: crate::effects::EffectSpec

use tracing::{debug, info, warn};

use crate::effects::Effect;
use crate::error::EditError;
use crate::raster::{Codec, EncodedImage, RasterError};

use super::data::{EffectView, HistoryOutcome, PreviewOutcome, Stage};
use super::edit::EffectState;
use super::history::History;

/// Snapshot of everything a preview render needs
///
/// Rendering happens outside the session (on a blocking worker); the result
/// is handed back through [`EditSession::install_preview`], which drops it
/// if the session has moved on in the meantime.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub effect: Effect,
    pub parameter: i32,
    pub source: EncodedImage,
}

impl RenderJob {
    /// Decode the source, apply the effect, re-encode
    pub fn run(&self, codec: &Codec) -> Result<EncodedImage, RasterError> {
        let img = codec.decode(&self.source)?;
        let rendered = self.effect.apply(&img, self.parameter);
        codec.encode(&rendered)
    }
}

/// What a Preview/Save press should do next
#[derive(Debug, Clone)]
pub enum PreviewStep {
    /// No preview for the current parameter yet: render one
    Render(RenderJob),
    /// A preview is staged: this press saves it
    Commit,
}

/// Full editing context for one user's in-progress image
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    history: History,
    effect: EffectState,
}

impl EditSession {
    pub fn new(history_limit: Option<usize>) -> Self {
        Self {
            history: History::new(history_limit),
            effect: EffectState::Closed,
        }
    }

    /// Currently saved image, `None` before the first upload
    pub fn committed(&self) -> Option<&EncodedImage> {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn effect_state(&self) -> &EffectState {
        &self.effect
    }

    /// Snapshot of the open menu, `None` while closed
    pub fn view(&self) -> Option<EffectView> {
        self.effect.view()
    }

    /// Start editing a newly uploaded image
    ///
    /// Replaces the committed image, clears both history stacks and closes
    /// any open menu.
    pub fn replace_image(&mut self, image: EncodedImage) {
        self.history.reset(image);
        self.effect.reset();
    }

    /// Open an effect menu at its default parameter
    ///
    /// Any previously open menu (and its staged preview) is discarded.
    pub fn open_effect(&mut self, effect: Effect) -> EffectView {
        if let Some(previous) = self.effect.active_effect() {
            debug!(?previous, ?effect, "switching effect menu");
        }
        self.effect = EffectState::open(effect);
        EffectView {
            effect,
            parameter: effect.default_parameter(),
            stage: Stage::Adjusting,
        }
    }

    /// Nudge the parameter by `delta`, clamped into the effect's bounds
    ///
    /// Always invalidates a staged preview, even when clamping leaves the
    /// value unchanged.
    pub fn adjust_parameter(&mut self, effect: Effect, delta: i32) -> Result<EffectView, EditError> {
        let current = self.ensure_open(effect)?;
        let parameter = effect.adjust(current, delta);

        if self.effect.is_previewing() {
            debug!(?effect, "staged preview invalidated by adjustment");
        }
        self.effect = EffectState::Adjusting { effect, parameter };

        Ok(EffectView {
            effect,
            parameter,
            stage: Stage::Adjusting,
        })
    }

    /// Work out what a Preview/Save press means right now
    ///
    /// Does not change state: rendering happens in [`RenderJob::run`] and is
    /// installed with [`install_preview`](Self::install_preview); saving
    /// happens in [`commit`](Self::commit).
    pub fn prepare_preview(&self, effect: Effect) -> Result<PreviewStep, EditError> {
        let parameter = self.ensure_open(effect)?;
        if self.effect.is_previewing() {
            return Ok(PreviewStep::Commit);
        }

        let source = self.committed().cloned().ok_or(EditError::NoImage)?;
        Ok(PreviewStep::Render(RenderJob {
            effect,
            parameter,
            source,
        }))
    }

    /// Stage a rendered preview if it still matches the session
    ///
    /// Returns false (and drops `staged`) when the effect, parameter or
    /// committed image changed since the job was prepared, or a preview is
    /// already staged.
    pub fn install_preview(&mut self, job: &RenderJob, staged: EncodedImage) -> bool {
        let still_current = matches!(
            self.effect,
            EffectState::Adjusting { effect, parameter }
                if effect == job.effect && parameter == job.parameter
        ) && self.committed() == Some(&job.source);

        if !still_current {
            warn!(effect = ?job.effect, parameter = job.parameter, "dropping stale preview render");
            return false;
        }

        debug!(effect = ?job.effect, parameter = job.parameter, bytes = staged.len(), "preview staged");
        self.effect = EffectState::Previewing {
            effect: job.effect,
            parameter: job.parameter,
            staged,
        };
        true
    }

    /// Save the staged preview as the new committed image
    ///
    /// Fails with `NoPreview` (leaving everything untouched) unless a
    /// preview is staged. On success the previous image goes onto the undo
    /// stack, the redo stack is cleared, and the menu closes.
    pub fn commit(&mut self) -> Result<EncodedImage, EditError> {
        let EffectState::Previewing {
            effect,
            parameter,
            staged,
        } = &self.effect
        else {
            return Err(EditError::NoPreview);
        };

        info!(?effect, parameter, "committing preview");
        let staged = staged.clone();
        self.history.push_commit(staged.clone());
        self.effect.reset();
        Ok(staged)
    }

    /// Preview/Save press, rendering inline on the calling thread
    ///
    /// First press renders `transform(committed, parameter)` and stages it;
    /// the press after that commits it.
    pub fn request_preview(&mut self, effect: Effect, codec: &Codec) -> Result<PreviewOutcome, EditError> {
        match self.prepare_preview(effect)? {
            PreviewStep::Commit => {
                self.commit()?;
            }
            PreviewStep::Render(job) => {
                let staged = job.run(codec)?;
                self.install_preview(&job, staged);
            }
        }
        Ok(self.preview_outcome())
    }

    /// Stage and image to show after a Preview/Save press
    pub fn preview_outcome(&self) -> PreviewOutcome {
        match &self.effect {
            EffectState::Previewing { staged, .. } => PreviewOutcome {
                stage: Stage::Previewing,
                image: Some(staged.clone()),
            },
            other => PreviewOutcome {
                stage: other.stage(),
                image: self.committed().cloned(),
            },
        }
    }

    /// Leave the effect menu without saving
    ///
    /// Returns the committed image, which is untouched.
    pub fn discard(&mut self, effect: Effect) -> Result<Option<EncodedImage>, EditError> {
        self.ensure_open(effect)?;
        debug!(?effect, "effect discarded");
        self.effect.reset();
        Ok(self.committed().cloned())
    }

    /// Step back one commit. An open menu is closed first when something is undone.
    pub fn undo(&mut self) -> HistoryOutcome {
        let applied = self.history.undo();
        self.history_outcome(applied)
    }

    /// Re-apply the last undone commit. An open menu is closed first when something is redone.
    pub fn redo(&mut self) -> HistoryOutcome {
        let applied = self.history.redo();
        self.history_outcome(applied)
    }

    fn history_outcome(&mut self, applied: bool) -> HistoryOutcome {
        if applied {
            // A staged preview was rendered from the image we just moved away from
            self.effect.reset();
        }
        HistoryOutcome {
            applied,
            image: if applied { self.committed().cloned() } else { None },
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    /// Current parameter of `effect`, or `EffectNotOpen` if another (or no) menu is open
    fn ensure_open(&self, effect: Effect) -> Result<i32, EditError> {
        match (self.effect.active_effect(), self.effect.parameter()) {
            (Some(active), Some(parameter)) if active == effect => Ok(parameter),
            (active, _) => Err(EditError::EffectNotOpen {
                requested: effect,
                active,
            }),
        }
    }
}
