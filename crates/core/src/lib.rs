pub mod backend;
pub mod config;
pub mod drawing;
pub mod editor;
pub mod history;
pub mod model;
pub mod reconcile;
pub mod selection;
pub mod submit;
pub mod validate;
pub mod views;

pub use backend::{BackendError, MapBackend, MemoryBackend};
pub use config::{ConfigError, EditorConfig};
pub use editor::{EditorError, MapEditor, Notice, NoticeLevel};
pub use history::{ChangeOrigin, History};
