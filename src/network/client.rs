use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::common::{ConversationCommand, ConversationEvent, ImageUpload, OutgoingMessage};
use crate::conversation::ingest;
use crate::error::{ClientError, Result};
use crate::storage::AuthContext;

use super::api::MessagesApi;

const CHANNEL_CAPACITY: usize = 100;

/// Latest fetch outcome, either `MessagesLoaded` or `LoadFailed`.
pub type Snapshot = Option<ConversationEvent>;

/// Credentials usable for a conversation, or `None` when the call must be
/// skipped (no session, or no counterpart).
fn usable_auth(auth: &Option<AuthContext>, counterpart: &str) -> Option<AuthContext> {
    if counterpart.trim().is_empty() {
        return None;
    }
    auth.clone()
}

/// Background worker for one mounted conversation.
///
/// Owns the poll timer and the command queue. At most one fetch is in
/// flight: ticks that land while one is running are skipped, explicit
/// refreshes are queued behind it. Fetch outcomes are published on a watch
/// channel so an undrained UI only ever holds the latest snapshot. Sends
/// and uploads run on a separate outbox task and never stall polling.
pub struct ConversationClient<A: MessagesApi> {
    api: Arc<A>,
    auth: Option<AuthContext>,
    counterpart: String,
    poll_interval: Duration,
    event_sender: mpsc::Sender<ConversationEvent>,
    snapshot_sender: watch::Sender<Snapshot>,
    command_receiver: mpsc::Receiver<ConversationCommand>,
    refresh: Arc<Notify>,
    outbox: Option<mpsc::Sender<Outgoing>>,
    outbox_task: Option<JoinHandle<()>>,
    fetch: Option<JoinHandle<ConversationEvent>>,
    refresh_queued: bool,
    next_seq: u64,
}

impl<A: MessagesApi> ConversationClient<A> {
    pub fn new(
        api: Arc<A>,
        auth: Option<AuthContext>,
        counterpart: String,
        poll_interval: Duration,
        event_sender: mpsc::Sender<ConversationEvent>,
        snapshot_sender: watch::Sender<Snapshot>,
        command_receiver: mpsc::Receiver<ConversationCommand>,
    ) -> Self {
        Self {
            api,
            auth,
            counterpart,
            poll_interval,
            event_sender,
            snapshot_sender,
            command_receiver,
            refresh: Arc::new(Notify::new()),
            outbox: None,
            outbox_task: None,
            fetch: None,
            refresh_queued: false,
            next_seq: 0,
        }
    }

    /// Run until the command channel closes. The first tick fires at once,
    /// which is the initial load.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.start_outbox();
        log::info!(
            "Polling conversation with `{}` every {:?}",
            self.counterpart,
            self.poll_interval
        );

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }
                _ = ticker.tick() => self.poll(),
                _ = self.refresh.notified() => self.request_fetch(),
                outcome = join_fetch(&mut self.fetch), if self.fetch.is_some() => {
                    self.finish_fetch(outcome);
                }
            }
        }

        log::debug!("Conversation with `{}` closed", self.counterpart);
    }

    fn start_outbox(&mut self) {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let outbox = Outbox {
            api: Arc::clone(&self.api),
            auth: self.auth.clone(),
            counterpart: self.counterpart.clone(),
            event_sender: self.event_sender.clone(),
            refresh: Arc::clone(&self.refresh),
            receiver,
        };
        self.outbox = Some(sender);
        self.outbox_task = Some(tokio::spawn(outbox.run()));
    }

    fn handle_command(&mut self, command: ConversationCommand) {
        match command {
            ConversationCommand::Refresh => self.request_fetch(),
            ConversationCommand::SendText(body) => self.enqueue(Outgoing::Text(body)),
            ConversationCommand::SendImage(path) => self.enqueue(Outgoing::Image(path)),
            ConversationCommand::FetchImage(url) => self.spawn_image_fetch(url),
        }
    }

    fn enqueue(&self, outgoing: Outgoing) {
        let Some(outbox) = &self.outbox else {
            return;
        };
        if let Err(err) = outbox.try_send(outgoing) {
            log::warn!("Outbox for `{}` rejected a message: {err}", self.counterpart);
        }
    }

    /// Timer tick: fetch unless the previous fetch is still running.
    fn poll(&mut self) {
        if self.fetch.is_some() {
            log::debug!("Skipping tick: fetch #{} still in flight", self.next_seq - 1);
            return;
        }
        self.spawn_fetch();
    }

    /// Explicit refresh: runs now, or right after the in-flight fetch.
    fn request_fetch(&mut self) {
        if self.fetch.is_some() {
            self.refresh_queued = true;
            return;
        }
        self.spawn_fetch();
    }

    fn spawn_fetch(&mut self) {
        let Some(auth) = usable_auth(&self.auth, &self.counterpart) else {
            log::debug!("Skipping fetch: no session or counterpart");
            return;
        };

        let seq = self.next_seq;
        self.next_seq += 1;

        let api = Arc::clone(&self.api);
        let counterpart = self.counterpart.clone();

        self.fetch = Some(tokio::spawn(async move {
            match api.list_conversation(&auth, &counterpart).await {
                Ok(wire) => ConversationEvent::MessagesLoaded {
                    seq,
                    messages: ingest(wire),
                },
                Err(err) => {
                    log::warn!("Failed to fetch conversation with `{counterpart}`: {err}");
                    ConversationEvent::LoadFailed {
                        seq,
                        error: err.to_string(),
                    }
                }
            }
        }));
    }

    fn finish_fetch(&mut self, outcome: Option<ConversationEvent>) {
        self.fetch = None;
        match outcome {
            Some(event) => {
                self.snapshot_sender.send_replace(Some(event));
            }
            None => log::warn!("Fetch task for `{}` did not complete", self.counterpart),
        }

        if std::mem::take(&mut self.refresh_queued) {
            self.spawn_fetch();
        }
    }

    fn spawn_image_fetch(&self, url: String) {
        let api = Arc::clone(&self.api);
        let event_sender = self.event_sender.clone();

        tokio::spawn(async move {
            let event = match api.fetch_image(&url).await {
                Ok(bytes) => ConversationEvent::ImageFetched { url, bytes },
                Err(err) => {
                    log::debug!("Failed to fetch image {url}: {err}");
                    ConversationEvent::ImageFetchFailed { url }
                }
            };
            let _ = event_sender.send(event).await;
        });
    }
}

impl<A: MessagesApi> Drop for ConversationClient<A> {
    fn drop(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
        if let Some(outbox) = self.outbox_task.take() {
            outbox.abort();
        }
    }
}

async fn join_fetch(fetch: &mut Option<JoinHandle<ConversationEvent>>) -> Option<ConversationEvent> {
    match fetch.as_mut() {
        Some(task) => task.await.ok(),
        None => std::future::pending().await,
    }
}

enum Outgoing {
    Text(String),
    Image(PathBuf),
}

/// Sends queued messages one at a time, in the order they were composed.
struct Outbox<A: MessagesApi> {
    api: Arc<A>,
    auth: Option<AuthContext>,
    counterpart: String,
    event_sender: mpsc::Sender<ConversationEvent>,
    refresh: Arc<Notify>,
    receiver: mpsc::Receiver<Outgoing>,
}

impl<A: MessagesApi> Outbox<A> {
    async fn run(mut self) {
        while let Some(outgoing) = self.receiver.recv().await {
            match outgoing {
                Outgoing::Text(body) => self.send_text(&body).await,
                Outgoing::Image(path) => self.send_image(&path).await,
            }
        }
    }

    async fn send_text(&self, body: &str) {
        let body = body.trim();
        if body.is_empty() {
            return;
        }
        let Some(auth) = usable_auth(&self.auth, &self.counterpart) else {
            log::debug!("Skipping send: no session or counterpart");
            return;
        };

        let message = OutgoingMessage {
            receiver_username: self.counterpart.clone(),
            content: body.to_string(),
        };

        match self.api.send_message(&auth, &message).await {
            Ok(()) => {
                self.emit(ConversationEvent::MessageSent).await;
                self.refresh.notify_one();
            }
            Err(err) => {
                let error = err.to_string();
                log::warn!("Failed to send message to `{}`: {error}", self.counterpart);
                self.emit(ConversationEvent::SendFailed(error)).await;
            }
        }
    }

    async fn send_image(&self, path: &Path) {
        let success = match self.upload_and_send(path).await {
            Ok(()) => true,
            Err(ClientError::MissingCredentials) => {
                log::debug!("Skipping image upload: no session or counterpart");
                false
            }
            Err(err) => {
                log::warn!("Failed to upload or send image {}: {err}", path.display());
                false
            }
        };

        self.emit(ConversationEvent::UploadFinished { success })
            .await;
        if success {
            self.refresh.notify_one();
        }
    }

    /// Upload, then send the hosted URL. Either step failing aborts.
    async fn upload_and_send(&self, path: &Path) -> Result<()> {
        let auth =
            usable_auth(&self.auth, &self.counterpart).ok_or(ClientError::MissingCredentials)?;

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let uploaded = self
            .api
            .upload_image(&auth, ImageUpload::new(file_name, bytes))
            .await?;
        log::info!("Uploaded image to {}", uploaded.url);

        let message = OutgoingMessage {
            receiver_username: self.counterpart.clone(),
            content: uploaded.url,
        };
        self.api.send_message(&auth, &message).await
    }

    async fn emit(&self, event: ConversationEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::debug!("Conversation unmounted; dropping event: {err}");
        }
    }
}

/// A mounted conversation. Dropping the handle unmounts it: the poll task
/// and everything it spawned are aborted, and the receivers go away, so
/// late responses from in-flight requests are discarded.
pub struct ConversationHandle {
    counterpart: String,
    commands: mpsc::Sender<ConversationCommand>,
    events: mpsc::Receiver<ConversationEvent>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl ConversationHandle {
    /// Spawn the poll task. Must be called inside a tokio runtime.
    pub fn mount<A: MessagesApi>(
        api: Arc<A>,
        auth: Option<AuthContext>,
        counterpart: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        let counterpart = counterpart.into();
        let (command_sender, command_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_sender, event_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (snapshot_sender, snapshot_receiver) = watch::channel(None);

        let client = ConversationClient::new(
            api,
            auth,
            counterpart.clone(),
            poll_interval,
            event_sender,
            snapshot_sender,
            command_receiver,
        );
        let task = tokio::spawn(client.run());

        Self {
            counterpart,
            commands: command_sender,
            events: event_receiver,
            snapshots: snapshot_receiver,
            task,
        }
    }

    pub fn counterpart(&self) -> &str {
        &self.counterpart
    }

    pub fn send(&self, command: ConversationCommand) {
        if let Err(err) = self.commands.try_send(command) {
            log::warn!("Failed to send command to conversation: {err}");
        }
    }

    /// Next pending event without waiting; used by the UI frame loop.
    /// Send and image results come first, then the latest unseen snapshot.
    pub fn try_next_event(&mut self) -> Option<ConversationEvent> {
        if let Ok(event) = self.events.try_recv() {
            return Some(event);
        }
        if self.snapshots.has_changed().unwrap_or(false) {
            return self.snapshots.borrow_and_update().clone();
        }
        None
    }

    pub async fn next_event(&mut self) -> Option<ConversationEvent> {
        if let Some(event) = self.try_next_event() {
            return Some(event);
        }

        tokio::select! {
            biased;
            event = self.events.recv() => event,
            changed = self.snapshots.changed() => match changed {
                Ok(()) => self.snapshots.borrow_and_update().clone(),
                Err(_) => None,
            },
        }
    }
}

impl Drop for ConversationHandle {
    fn drop(&mut self) {
        self.task.abort();
        log::debug!("Unmounted conversation with `{}`", self.counterpart);
    }
}
