pub mod customization;
pub mod document;
pub mod error;
pub mod events;
pub mod gesture;
pub mod history;
pub mod placement;
pub mod sheet;
pub mod state;
pub mod storage;
pub mod tabs;
pub mod zone;

mod sheet_ops;
mod undo_redo;
mod zone_ops;

pub use document::Document;
pub use error::StorageError;
pub use sheet_ops::RESET_TABS_PROMPT;
pub use zone_ops::{CLEAR_ALL_PROMPT, DUPLICATE_OFFSET};

#[cfg(test)]
pub mod harness;
