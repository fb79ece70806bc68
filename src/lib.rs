//! Session engine for staged, undoable photo edits.
//!
//! A user uploads a JPEG, opens an effect menu (brightness, contrast or
//! pixelate), nudges its parameter, previews the result and saves it. Every
//! save can be undone and redone. The engine keeps one session per user and
//! knows nothing about the chat or HTTP layer driving it.
//!
//! ```no_run
//! # async fn demo(bytes: Vec<u8>) -> Result<(), photo_session::EditError> {
//! use photo_session::{Direction, Editor, Effect, SessionId};
//!
//! let editor = Editor::default();
//! let user = SessionId(42);
//!
//! editor.upload_image(user, bytes).await?;
//! editor.open_effect(user, Effect::Brightness).await;
//! editor.adjust_parameter(user, Effect::Brightness, Direction::Increase).await?;
//! let preview = editor.request_preview_or_commit(user, Effect::Brightness).await?;
//! let saved = editor.request_preview_or_commit(user, Effect::Brightness).await?;
//! # let _ = (preview, saved);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod editor;
pub mod effects;
pub mod error;
pub mod raster;
pub mod state;

pub use config::{ConfigError, EditorConfig};
pub use editor::Editor;
pub use effects::{Direction, Effect};
pub use error::EditError;
pub use raster::{Codec, EncodedImage, RasterError, RasterImage};
pub use state::{EffectView, HistoryOutcome, PreviewOutcome, SessionId, Stage};
