/// Ephemeral effect-menu state for a session
///
/// This is the half of a session that only exists while an effect menu is
/// open: which effect, its current parameter, and the staged preview.
/// A staged preview can only exist in the `Previewing` variant, so a
/// preview that does not belong to the current parameter is unrepresentable
/// once every parameter change goes back through `Adjusting`.

use crate::effects::Effect;
use crate::raster::EncodedImage;

use super::data::{EffectView, Stage};

/// Where the preview/commit state machine currently is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EffectState {
    /// No effect menu open
    #[default]
    Closed,

    /// Menu open, parameter edited, nothing rendered for it yet
    Adjusting { effect: Effect, parameter: i32 },

    /// Preview rendered for exactly this effect and parameter; the next
    /// preview press saves it
    Previewing {
        effect: Effect,
        parameter: i32,
        staged: EncodedImage,
    },
}

impl EffectState {
    /// Freshly opened menu at the effect's default parameter
    pub fn open(effect: Effect) -> Self {
        EffectState::Adjusting {
            effect,
            parameter: effect.default_parameter(),
        }
    }

    pub fn active_effect(&self) -> Option<Effect> {
        match self {
            EffectState::Closed => None,
            EffectState::Adjusting { effect, .. } | EffectState::Previewing { effect, .. } => {
                Some(*effect)
            }
        }
    }

    /// Current parameter, `None` while closed
    pub fn parameter(&self) -> Option<i32> {
        match self {
            EffectState::Closed => None,
            EffectState::Adjusting { parameter, .. }
            | EffectState::Previewing { parameter, .. } => Some(*parameter),
        }
    }

    /// True once a preview has been rendered and is awaiting save
    pub fn is_previewing(&self) -> bool {
        matches!(self, EffectState::Previewing { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, EffectState::Closed)
    }

    pub fn staged_preview(&self) -> Option<&EncodedImage> {
        match self {
            EffectState::Previewing { staged, .. } => Some(staged),
            _ => None,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            EffectState::Closed => Stage::Closed,
            EffectState::Adjusting { .. } => Stage::Adjusting,
            EffectState::Previewing { .. } => Stage::Previewing,
        }
    }

    /// Transport-facing snapshot, `None` while closed
    pub fn view(&self) -> Option<EffectView> {
        Some(EffectView {
            effect: self.active_effect()?,
            parameter: self.parameter()?,
            stage: self.stage(),
        })
    }

    /// Close the menu, dropping the parameter and any staged preview
    pub fn reset(&mut self) {
        *self = EffectState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_closed() {
        let state = EffectState::default();
        assert!(state.is_closed());
        assert_eq!(state.active_effect(), None);
        assert_eq!(state.parameter(), None);
        assert_eq!(state.view(), None);
    }

    #[test]
    fn test_open_uses_default_parameter() {
        let state = EffectState::open(Effect::Pixelate);
        assert_eq!(state.active_effect(), Some(Effect::Pixelate));
        assert_eq!(state.parameter(), Some(1));
        assert_eq!(state.stage(), Stage::Adjusting);
        assert!(state.staged_preview().is_none());
    }

    #[test]
    fn test_previewing_exposes_staged_image() {
        let staged = EncodedImage::from(vec![1, 2, 3]);
        let state = EffectState::Previewing {
            effect: Effect::Contrast,
            parameter: 20,
            staged: staged.clone(),
        };
        assert!(state.is_previewing());
        assert_eq!(state.staged_preview(), Some(&staged));
        assert_eq!(
            state.view(),
            Some(EffectView {
                effect: Effect::Contrast,
                parameter: 20,
                stage: Stage::Previewing,
            })
        );
    }

    #[test]
    fn test_reset() {
        let mut state = EffectState::open(Effect::Brightness);
        state.reset();
        assert!(state.is_closed());
    }
}
