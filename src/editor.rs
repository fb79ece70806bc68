//! Async front door to the session engine.
//!
//! The transport layer (chat bot, HTTP handler, CLI) calls one method per
//! user event. Each call locks that user's session for its whole duration,
//! so events from one user apply strictly in arrival order. CPU-bound
//! decode/transform/encode work runs on tokio's blocking pool.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::effects::{Direction, Effect};
use crate::error::EditError;
use crate::raster::{Codec, EncodedImage};
use crate::state::data::{EffectView, HistoryOutcome, PreviewOutcome, SessionId};
use crate::state::session::PreviewStep;
use crate::state::store::SessionStore;

/// Session engine shared by every request handler
#[derive(Debug, Clone)]
pub struct Editor {
    store: Arc<SessionStore>,
    codec: Codec,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            store: Arc::new(SessionStore::from_config(&config)),
            codec: config.codec(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Start the idle-session reaper on the current runtime
    pub fn spawn_reaper(&self) -> JoinHandle<()> {
        self.store.spawn_reaper(self.config.sweep_interval())
    }

    /// New photo from the user: becomes the committed image with empty history
    ///
    /// The bytes are decoded once to reject unreadable uploads. On a decode
    /// error the session is left exactly as it was.
    pub async fn upload_image(&self, id: SessionId, bytes: Vec<u8>) -> Result<EncodedImage, EditError> {
        let image = EncodedImage::from(bytes);
        let probe = image.clone();
        let codec = self.codec;

        let decoded = tokio::task::spawn_blocking(move || codec.decode(&probe)).await?;
        let raster = match decoded {
            Ok(raster) => raster,
            Err(e) => {
                warn!(session = %id, error = %e, "rejected upload");
                return Err(e.into());
            }
        };

        info!(
            session = %id,
            width = raster.width(),
            height = raster.height(),
            bytes = image.len(),
            "image uploaded"
        );
        self.store.replace(id, image.clone()).await;
        Ok(image)
    }

    pub async fn open_effect(&self, id: SessionId, effect: Effect) -> EffectView {
        let mut slot = self.store.checkout(id).await;
        slot.session.open_effect(effect)
    }

    /// "+" / "-" press: move the parameter by the configured step
    pub async fn adjust_parameter(
        &self,
        id: SessionId,
        effect: Effect,
        direction: Direction,
    ) -> Result<EffectView, EditError> {
        let delta = direction.delta(self.config.step(effect));
        let mut slot = self.store.checkout(id).await;
        slot.session.adjust_parameter(effect, delta)
    }

    /// Preview/Save press
    ///
    /// Renders and stages a preview when none is staged for the current
    /// parameter; otherwise saves the staged preview and closes the menu.
    pub async fn request_preview_or_commit(
        &self,
        id: SessionId,
        effect: Effect,
    ) -> Result<PreviewOutcome, EditError> {
        let mut slot = self.store.checkout(id).await;

        match slot.session.prepare_preview(effect)? {
            PreviewStep::Commit => {
                slot.session.commit()?;
            }
            PreviewStep::Render(job) => {
                let render = job.clone();
                let codec = self.codec;
                let staged = tokio::task::spawn_blocking(move || render.run(&codec)).await??;
                if !slot.session.install_preview(&job, staged) {
                    debug!(session = %id, "render result discarded");
                }
            }
        }

        Ok(slot.session.preview_outcome())
    }

    /// Back press inside an effect menu: drop unsaved changes
    pub async fn discard(&self, id: SessionId, effect: Effect) -> Result<Option<EncodedImage>, EditError> {
        let mut slot = self.store.checkout(id).await;
        slot.session.discard(effect)
    }

    pub async fn undo(&self, id: SessionId) -> HistoryOutcome {
        let mut slot = self.store.checkout(id).await;
        let outcome = slot.session.undo();
        debug!(session = %id, applied = outcome.applied, "undo");
        outcome
    }

    pub async fn redo(&self, id: SessionId) -> HistoryOutcome {
        let mut slot = self.store.checkout(id).await;
        let outcome = slot.session.redo();
        debug!(session = %id, applied = outcome.applied, "redo");
        outcome
    }

    /// Committed image for `id`, without creating a session
    pub async fn current_image(&self, id: SessionId) -> Option<EncodedImage> {
        let handle = self.store.get(id).await?;
        let slot = handle.lock().await;
        slot.session.committed().cloned()
    }

    /// Open menu for `id`, if any
    pub async fn current_view(&self, id: SessionId) -> Option<EffectView> {
        let handle = self.store.get(id).await?;
        let slot = handle.lock().await;
        slot.session.view()
    }

    /// Start over: forget the image, history and open menu for `id`
    ///
    /// Waits for any in-flight event on the session to finish first.
    /// Returns false if there was no session.
    pub async fn reset_session(&self, id: SessionId) -> bool {
        let Some(handle) = self.store.get(id).await else {
            return false;
        };
        let _slot = handle.lock().await;
        let removed = self.store.remove(id).await;
        if removed {
            info!(session = %id, "session reset");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::transform;
    use crate::raster::{decode, RasterImage};
    use crate::state::data::Stage;

    fn sample_jpeg(seed: u8) -> Vec<u8> {
        let img = RasterImage::from_fn(32, 20, |x, y| {
            [(x * 7) as u8 ^ seed, (y * 11) as u8, seed.wrapping_mul(3)]
        });
        Codec::default().encode(&img).unwrap().to_vec()
    }

    fn expected(source: &[u8], f: fn(&RasterImage, i32) -> RasterImage, parameter: i32) -> EncodedImage {
        let img = decode(source).unwrap();
        Codec::default().encode(&f(&img, parameter)).unwrap()
    }

    #[tokio::test]
    async fn test_brightness_scenario() {
        let editor = Editor::default();
        let id = SessionId(100);
        let a = editor.upload_image(id, sample_jpeg(1)).await.unwrap();

        let view = editor.open_effect(id, Effect::Brightness).await;
        assert_eq!(view.parameter, 0);

        let view = editor
            .adjust_parameter(id, Effect::Brightness, Direction::Increase)
            .await
            .unwrap();
        assert_eq!(view.parameter, 10);
        assert_eq!(view.to_string(), "Brightness: 10 (unsaved)");

        let preview = editor.request_preview_or_commit(id, Effect::Brightness).await.unwrap();
        assert_eq!(preview.stage, Stage::Previewing);
        let b = expected(&a, transform::brightness, 10);
        assert_eq!(preview.image, Some(b.clone()));
        assert_eq!(editor.current_image(id).await, Some(a.clone()));

        let saved = editor.request_preview_or_commit(id, Effect::Brightness).await.unwrap();
        assert_eq!(saved.stage, Stage::Closed);
        assert_eq!(editor.current_image(id).await, Some(b.clone()));
        assert_eq!(editor.current_view(id).await, None);

        let undone = editor.undo(id).await;
        assert!(undone.applied);
        assert_eq!(undone.image, Some(a.clone()));
        assert!(undone.can_redo);

        let redone = editor.redo(id).await;
        assert_eq!(redone.image, Some(b));
        assert!(!redone.can_redo);
    }

    #[tokio::test]
    async fn test_contrast_and_pixelate_steps() {
        let editor = Editor::default();
        let id = SessionId(7);
        let a = editor.upload_image(id, sample_jpeg(2)).await.unwrap();

        editor.open_effect(id, Effect::Contrast).await;
        for _ in 0..3 {
            editor
                .adjust_parameter(id, Effect::Contrast, Direction::Decrease)
                .await
                .unwrap();
        }
        let outcome = editor.request_preview_or_commit(id, Effect::Contrast).await.unwrap();
        assert_eq!(outcome.image, Some(expected(&a, transform::contrast, -30)));

        editor.open_effect(id, Effect::Pixelate).await;
        let view = editor
            .adjust_parameter(id, Effect::Pixelate, Direction::Decrease)
            .await
            .unwrap();
        assert_eq!(view.parameter, 1);
        let view = editor
            .adjust_parameter(id, Effect::Pixelate, Direction::Increase)
            .await
            .unwrap();
        assert_eq!(view.parameter, 2);
    }

    #[tokio::test]
    async fn test_bad_upload_leaves_session_untouched() {
        let editor = Editor::default();
        let id = SessionId(3);
        let a = editor.upload_image(id, sample_jpeg(3)).await.unwrap();
        editor.open_effect(id, Effect::Brightness).await;

        let err = editor.upload_image(id, b"not a jpeg".to_vec()).await.unwrap_err();
        assert!(err.is_decode());
        assert_eq!(editor.current_image(id).await, Some(a));
        assert_eq!(
            editor.current_view(id).await.map(|v| v.effect),
            Some(Effect::Brightness)
        );

        let err = editor.upload_image(SessionId(4), Vec::new()).await.unwrap_err();
        assert!(err.is_decode());
        assert_eq!(editor.current_image(SessionId(4)).await, None);
    }

    #[tokio::test]
    async fn test_preview_before_upload() {
        let editor = Editor::default();
        let id = SessionId(11);
        editor.open_effect(id, Effect::Contrast).await;
        let err = editor.request_preview_or_commit(id, Effect::Contrast).await.unwrap_err();
        assert!(matches!(err, EditError::NoImage));
    }

    #[tokio::test]
    async fn test_wrong_menu_is_rejected() {
        let editor = Editor::default();
        let id = SessionId(12);
        editor.upload_image(id, sample_jpeg(4)).await.unwrap();
        editor.open_effect(id, Effect::Brightness).await;

        let err = editor
            .adjust_parameter(id, Effect::Pixelate, Direction::Increase)
            .await
            .unwrap_err();
        assert!(matches!(err, EditError::EffectNotOpen { .. }));
        assert!(editor.discard(id, Effect::Contrast).await.is_err());
    }

    #[tokio::test]
    async fn test_discard_returns_committed() {
        let editor = Editor::default();
        let id = SessionId(13);
        let a = editor.upload_image(id, sample_jpeg(5)).await.unwrap();
        editor.open_effect(id, Effect::Brightness).await;
        editor
            .adjust_parameter(id, Effect::Brightness, Direction::Increase)
            .await
            .unwrap();
        editor.request_preview_or_commit(id, Effect::Brightness).await.unwrap();

        assert_eq!(editor.discard(id, Effect::Brightness).await.unwrap(), Some(a.clone()));
        assert_eq!(editor.current_image(id).await, Some(a));
        assert!(!editor.undo(id).await.applied);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let editor = Editor::default();
        let (u1, u2) = (SessionId(1), SessionId(2));
        let a1 = editor.upload_image(u1, sample_jpeg(6)).await.unwrap();
        let a2 = editor.upload_image(u2, sample_jpeg(7)).await.unwrap();

        editor.open_effect(u1, Effect::Brightness).await;
        editor
            .adjust_parameter(u1, Effect::Brightness, Direction::Increase)
            .await
            .unwrap();
        editor.request_preview_or_commit(u1, Effect::Brightness).await.unwrap();
        editor.request_preview_or_commit(u1, Effect::Brightness).await.unwrap();

        assert_ne!(editor.current_image(u1).await, Some(a1));
        assert_eq!(editor.current_image(u2).await, Some(a2));
        assert!(!editor.undo(u2).await.applied);
    }

    #[tokio::test]
    async fn test_reset_session_forgets_everything() {
        let editor = Editor::default();
        let id = SessionId(21);
        editor.upload_image(id, sample_jpeg(8)).await.unwrap();
        editor.open_effect(id, Effect::Contrast).await;

        assert!(editor.reset_session(id).await);
        assert_eq!(editor.current_image(id).await, None);
        assert_eq!(editor.current_view(id).await, None);
        assert!(!editor.undo(id).await.applied);
        assert!(!editor.reset_session(SessionId(22)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_double_press_on_one_session_is_serialized() {
        let editor = Editor::default();
        let id = SessionId(30);

        for round in 0..10u8 {
            let a = editor.upload_image(id, sample_jpeg(round)).await.unwrap();
            editor.open_effect(id, Effect::Brightness).await;
            editor
                .adjust_parameter(id, Effect::Brightness, Direction::Increase)
                .await
                .unwrap();

            let first = tokio::spawn({
                let editor = editor.clone();
                async move { editor.request_preview_or_commit(id, Effect::Brightness).await }
            });
            let second = tokio::spawn({
                let editor = editor.clone();
                async move { editor.request_preview_or_commit(id, Effect::Brightness).await }
            });

            let mut stages = vec![
                first.await.unwrap().unwrap().stage,
                second.await.unwrap().unwrap().stage,
            ];
            stages.sort_by_key(|stage| *stage == Stage::Closed);
            assert_eq!(stages, vec![Stage::Previewing, Stage::Closed]);

            let b = expected(&a, transform::brightness, 10);
            assert_eq!(editor.current_image(id).await, Some(b));

            let undone = editor.undo(id).await;
            assert_eq!(undone.image, Some(a));
            assert!(!undone.can_undo);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_users() {
        let editor = Editor::default();
        let mut tasks = Vec::new();

        for n in 0..8u8 {
            let editor = editor.clone();
            tasks.push(tokio::spawn(async move {
                let id = SessionId(i64::from(n));
                let a = editor.upload_image(id, sample_jpeg(n)).await.unwrap();
                editor.open_effect(id, Effect::Pixelate).await;
                for _ in 0..n {
                    editor
                        .adjust_parameter(id, Effect::Pixelate, Direction::Increase)
                        .await
                        .unwrap();
                }
                editor.request_preview_or_commit(id, Effect::Pixelate).await.unwrap();
                editor.request_preview_or_commit(id, Effect::Pixelate).await.unwrap();
                (id, expected(&a, transform::pixelate, 1 + i32::from(n)))
            }));
        }

        for task in tasks {
            let (id, want) = task.await.unwrap();
            assert_eq!(editor.current_image(id).await, Some(want));
        }
        assert_eq!(editor.store().len().await, 8);
    }
}
