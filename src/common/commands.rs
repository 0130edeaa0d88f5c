use std::path::PathBuf;

/// Commands the UI sends to a mounted conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationCommand {
    /// Fetch the full thread now, outside the poll schedule.
    Refresh,
    /// Send the composer text. Trimmed by the client; blank text is ignored.
    SendText(String),
    /// Upload the image at `path`, then send its hosted URL as a message.
    SendImage(PathBuf),
    /// Download a remote image so the UI can render it.
    FetchImage(String),
}
