pub mod commands;
pub mod events;
pub mod types;

pub use commands::ConversationCommand;
pub use events::ConversationEvent;
pub use types::{ImageUpload, OutgoingMessage, UploadedImage, WireMessage};
