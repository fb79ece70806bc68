/// Committed image plus its linear undo/redo stacks
///
/// This is the persistent half of a session: it survives opening and
/// closing effect menus and only changes on upload, commit, undo and redo.

use std::collections::VecDeque;

use crate::raster::EncodedImage;

/// Linear edit history
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Currently saved image, `None` until the first upload
    current: Option<EncodedImage>,
    /// Older images, most recent at the back
    undo: VecDeque<EncodedImage>,
    /// Undone images, most recent at the back
    redo: Vec<EncodedImage>,
    /// Maximum undo depth, `None` = unbounded
    limit: Option<usize>,
}

impl History {
    /// Create an empty history with an optional undo depth cap
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&EncodedImage> {
        self.current.as_ref()
    }

    /// Start over from a freshly uploaded image, dropping both stacks
    pub fn reset(&mut self, image: EncodedImage) {
        self.current = Some(image);
        self.undo.clear();
        self.redo.clear();
    }

    /// Make `image` the saved image, remembering the previous one
    ///
    /// Always clears the redo branch.
    pub fn push_commit(&mut self, image: EncodedImage) {
        if let Some(previous) = self.current.replace(image) {
            self.undo.push_back(previous);
            self.enforce_limit();
        }
        self.redo.clear();
    }

    /// Step back one commit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        if let Some(current) = self.current.replace(previous) {
            self.redo.push(current);
        }
        true
    }

    /// Re-apply the last undone commit. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        if let Some(current) = self.current.replace(next) {
            self.undo.push_back(current);
            self.enforce_limit();
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Undo stack, oldest first
    pub fn undo_stack(&self) -> impl Iterator<Item = &EncodedImage> {
        self.undo.iter()
    }

    /// Redo stack, oldest first
    pub fn redo_stack(&self) -> impl Iterator<Item = &EncodedImage> {
        self.redo.iter()
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                self.undo.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(tag: u8) -> EncodedImage {
        EncodedImage::from(vec![0xFF, 0xD8, tag])
    }

    fn stack<'a>(it: impl Iterator<Item = &'a EncodedImage>) -> Vec<EncodedImage> {
        it.cloned().collect()
    }

    #[test]
    fn test_push_then_undo_restores_previous() {
        let mut history = History::default();
        history.reset(img(1));
        history.push_commit(img(2));

        assert!(history.undo());
        assert_eq!(history.current(), Some(&img(1)));
        assert_eq!(stack(history.redo_stack()), vec![img(2)]);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_then_redo_restores_undone() {
        let mut history = History::default();
        history.reset(img(1));
        history.push_commit(img(2));
        history.push_commit(img(3));

        assert!(history.undo());
        assert!(history.redo());
        assert_eq!(history.current(), Some(&img(3)));
        assert_eq!(stack(history.undo_stack()), vec![img(1), img(2)]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_commit_clears_redo_branch() {
        let mut history = History::default();
        history.reset(img(1));
        history.push_commit(img(2));
        history.push_commit(img(3));
        history.undo();
        history.undo();
        assert_eq!(history.redo_depth(), 2);

        history.push_commit(img(9));
        assert_eq!(history.redo_depth(), 0);
        assert!(!history.redo());
        assert_eq!(stack(history.undo_stack()), vec![img(1)]);
        assert_eq!(history.current(), Some(&img(9)));
    }

    #[test]
    fn test_empty_stacks_signal_nothing_to_do() {
        let mut history = History::default();
        assert!(!history.undo());
        assert!(!history.redo());

        history.reset(img(1));
        assert!(!history.undo());
        assert_eq!(history.current(), Some(&img(1)));
    }

    #[test]
    fn test_push_without_current_only_sets_current() {
        let mut history = History::default();
        history.push_commit(img(5));
        assert_eq!(history.current(), Some(&img(5)));
        assert_eq!(history.undo_depth(), 0);
    }

    #[test]
    fn test_reset_drops_both_stacks() {
        let mut history = History::default();
        history.reset(img(1));
        history.push_commit(img(2));
        history.push_commit(img(3));
        history.undo();

        history.reset(img(7));
        assert_eq!(history.current(), Some(&img(7)));
        assert_eq!(history.undo_depth(), 0);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_limit_drops_oldest_entries() {
        let mut history = History::new(Some(2));
        history.reset(img(0));
        for tag in 1..=4 {
            history.push_commit(img(tag));
        }
        assert_eq!(stack(history.undo_stack()), vec![img(2), img(3)]);

        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(history.current(), Some(&img(2)));
    }
}
