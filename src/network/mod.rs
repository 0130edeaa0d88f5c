pub mod api;
pub mod client;
pub mod transport;

pub use api::{MessagesApi, RestApi};
pub use client::{ConversationClient, ConversationHandle};
