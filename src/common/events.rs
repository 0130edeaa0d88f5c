use crate::conversation::ConversationMessage;

/// Events a mounted conversation sends back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// A full snapshot of the thread, tagged with the fetch sequence number.
    MessagesLoaded {
        seq: u64,
        messages: Vec<ConversationMessage>,
    },
    LoadFailed {
        seq: u64,
        error: String,
    },
    MessageSent,
    SendFailed(String),
    UploadFinished {
        success: bool,
    },
    ImageFetched {
        url: String,
        bytes: Vec<u8>,
    },
    ImageFetchFailed {
        url: String,
    },
}
