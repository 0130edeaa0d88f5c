pub mod app;
pub mod components;
pub mod images;
pub mod state;

pub use app::ChatApp;
pub use state::{ConversationState, Phase};
