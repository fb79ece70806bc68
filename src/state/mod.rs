/// State management module
///
/// This module handles all per-user editing state, including:
/// - Shared data structures handed to the transport (data.rs)
/// - The open effect menu and its staged preview (edit.rs)
/// - Committed images and undo/redo stacks (history.rs)
/// - The preview/commit state machine (session.rs)
/// - The concurrent map of live sessions and idle eviction (store.rs)

pub mod data;
pub mod edit;
pub mod history;
pub mod session;
pub mod store;

pub use data::{EffectView, HistoryOutcome, PreviewOutcome, SessionId, Stage};
pub use edit::EffectState;
pub use history::History;
pub use session::{EditSession, PreviewStep, RenderJob};
pub use store::{SessionGuard, SessionSlot, SessionStore};
