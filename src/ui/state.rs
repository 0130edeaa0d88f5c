use chrono::{DateTime, TimeZone};

use crate::common::ConversationEvent;
use crate::conversation::{ConversationMessage, DayGroup, MessageSide, group_by_day};

/// Shown in place of the thread when the first load fails.
pub const LOAD_ERROR_MESSAGE: &str = "Could not load conversation.";

/// Poll lifecycle of a mounted conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    /// At least one snapshot applied. Later failures stay here.
    Ready,
    /// Every fetch so far has failed.
    Failed,
}

/// Scroll tracking for the message list.
#[derive(Debug, Clone)]
pub struct ScrollState {
    at_bottom: bool,
    threshold: f32,
    pending: bool,
    after_next_snapshot: bool,
}

impl ScrollState {
    pub fn new(threshold: f32) -> Self {
        Self {
            at_bottom: true,
            threshold,
            pending: false,
            after_next_snapshot: false,
        }
    }

    /// Record the scroll position reported by the list after a frame.
    pub fn update_position(&mut self, content_height: f32, offset: f32, viewport_height: f32) {
        self.at_bottom = content_height - offset - viewport_height < self.threshold;
    }

    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    pub fn show_jump_button(&self) -> bool {
        !self.at_bottom
    }

    pub fn jump_to_bottom(&mut self) {
        self.pending = true;
    }

    /// Whether the list should scroll to the bottom this frame.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    fn scroll_after_next_snapshot(&mut self) {
        self.after_next_snapshot = true;
    }

    fn on_snapshot(&mut self, changed: bool) {
        if self.after_next_snapshot || (changed && self.at_bottom) {
            self.pending = true;
        }
        self.after_next_snapshot = false;
    }
}

/// View model of the conversation screen for one counterpart.
pub struct ConversationState {
    counterpart: String,
    current_user: String,
    phase: Phase,
    messages: Vec<ConversationMessage>,
    error: Option<String>,
    pub composer: String,
    /// Text handed to the network and not yet confirmed or rejected.
    pending_send: Option<String>,
    uploading: bool,
    pub scroll: ScrollState,
    last_applied_seq: Option<u64>,
}

impl ConversationState {
    pub fn new(counterpart: String, current_user: String, scroll_threshold: f32) -> Self {
        Self {
            counterpart,
            current_user,
            phase: Phase::Idle,
            messages: Vec::new(),
            error: None,
            composer: String::new(),
            pending_send: None,
            uploading: false,
            scroll: ScrollState::new(scroll_threshold),
            last_applied_seq: None,
        }
    }

    /// Called on mount.
    pub fn begin_loading(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Loading;
        }
    }

    pub fn counterpart(&self) -> &str {
        &self.counterpart
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Loading)
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// The error that replaces the thread, only before any snapshot landed.
    pub fn blocking_error(&self) -> Option<&str> {
        match self.phase {
            Phase::Failed => self.error.as_deref(),
            _ => None,
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn side_of(&self, message: &ConversationMessage) -> MessageSide {
        message.side(&self.current_user)
    }

    pub fn day_groups<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<DayGroup<'_>> {
        group_by_day(&self.messages, now)
    }

    pub fn is_sending(&self) -> bool {
        self.pending_send.is_some()
    }

    pub fn can_send(&self) -> bool {
        !self.uploading && !self.is_sending() && !self.composer.trim().is_empty()
    }

    /// Trimmed composer text to send, or `None` when there is nothing to
    /// send or a send is still in flight. The composer is cleared once the
    /// send succeeds, unless it was edited in the meantime.
    pub fn take_outgoing_text(&mut self) -> Option<String> {
        if !self.can_send() {
            return None;
        }
        let text = self.composer.trim().to_string();
        self.pending_send = Some(text.clone());
        Some(text)
    }

    /// Mark an upload as started; `false` if one is already running.
    pub fn begin_upload(&mut self) -> bool {
        if self.uploading {
            return false;
        }
        self.uploading = true;
        true
    }

    /// Replace the thread with a snapshot unless a newer one was applied.
    pub fn apply_snapshot(&mut self, seq: u64, messages: Vec<ConversationMessage>) -> bool {
        if self.last_applied_seq.is_some_and(|last| seq <= last) {
            log::debug!("Discarding stale snapshot #{seq}");
            return false;
        }

        let changed = self.messages != messages;
        self.last_applied_seq = Some(seq);
        self.messages = messages;
        self.error = None;
        self.phase = Phase::Ready;
        self.scroll.on_snapshot(changed);
        true
    }

    pub fn apply_failure(&mut self, seq: u64, error: &str) -> bool {
        if self.last_applied_seq.is_some_and(|last| seq < last) {
            log::debug!("Discarding stale failure #{seq}");
            return false;
        }

        match self.phase {
            Phase::Ready => {
                log::warn!(
                    "Refreshing conversation with `{}` failed: {error}",
                    self.counterpart
                );
            }
            Phase::Idle | Phase::Loading | Phase::Failed => {
                log::error!(
                    "Loading conversation with `{}` failed: {error}",
                    self.counterpart
                );
                self.phase = Phase::Failed;
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    pub fn apply(&mut self, event: ConversationEvent) {
        match event {
            ConversationEvent::MessagesLoaded { seq, messages } => {
                self.apply_snapshot(seq, messages);
            }
            ConversationEvent::LoadFailed { seq, error } => {
                self.apply_failure(seq, &error);
            }
            ConversationEvent::MessageSent => {
                let sent = self.pending_send.take();
                if sent.is_some_and(|sent| self.composer.trim() == sent) {
                    self.composer.clear();
                }
                self.scroll.scroll_after_next_snapshot();
            }
            ConversationEvent::SendFailed(error) => {
                self.pending_send = None;
                log::debug!("Keeping composer text after failed send: {error}");
            }
            ConversationEvent::UploadFinished { success } => {
                self.uploading = false;
                if success {
                    self.scroll.scroll_after_next_snapshot();
                }
            }
            ConversationEvent::ImageFetched { .. } | ConversationEvent::ImageFetchFailed { .. } => {}
        }
    }
}
