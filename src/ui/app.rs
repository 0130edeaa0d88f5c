use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::common::{ConversationCommand, ConversationEvent};
use crate::config::AppConfig;
use crate::network::{ConversationHandle, RestApi};
use crate::storage::AuthContext;

use super::components::{chat_area, input_bar, sidebar};
use super::images::ImageCache;
use super::state::ConversationState;

const MAX_RECENT: usize = 10;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

pub struct ChatApp {
    runtime: tokio::runtime::Handle,
    api: Arc<RestApi>,
    auth: Option<AuthContext>,
    config: AppConfig,
    state: Option<ConversationState>,
    handle: Option<ConversationHandle>,
    images: ImageCache,
    counterpart_input: String,
    recent: Vec<String>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        runtime: tokio::runtime::Handle,
        api: Arc<RestApi>,
        auth: Option<AuthContext>,
        config: AppConfig,
        initial_counterpart: Option<String>,
    ) -> Self {
        let mut app = Self {
            runtime,
            api,
            auth,
            config,
            state: None,
            handle: None,
            images: ImageCache::default(),
            counterpart_input: String::new(),
            recent: Vec::new(),
        };

        if let Some(counterpart) = initial_counterpart {
            app.open_conversation(&counterpart);
        }
        app
    }

    /// Unmount the current conversation (if any) and mount a fresh one.
    fn open_conversation(&mut self, counterpart: &str) {
        let counterpart = counterpart.trim();
        if counterpart.is_empty() {
            return;
        }
        if self
            .handle
            .as_ref()
            .is_some_and(|handle| handle.counterpart() == counterpart)
        {
            return;
        }

        // Drop the old handle first so its poll stops before the new one starts.
        self.handle = None;
        self.state = None;
        self.images.clear();

        let current_user = self
            .auth
            .as_ref()
            .map(|auth| auth.username().to_string())
            .unwrap_or_default();
        let mut state = ConversationState::new(
            counterpart.to_string(),
            current_user,
            self.config.scroll_bottom_threshold,
        );
        state.begin_loading();

        let _runtime = self.runtime.enter();
        self.handle = Some(ConversationHandle::mount(
            Arc::clone(&self.api),
            self.auth.clone(),
            counterpart,
            self.config.poll_interval(),
        ));
        self.state = Some(state);

        self.recent.retain(|entry| entry != counterpart);
        self.recent.insert(0, counterpart.to_string());
        self.recent.truncate(MAX_RECENT);
        log::info!("Opened conversation with `{counterpart}`");
    }

    fn handle_conversation_events(&mut self, ctx: &egui::Context) {
        let (Some(handle), Some(state)) = (self.handle.as_mut(), self.state.as_mut()) else {
            return;
        };

        while let Some(event) = handle.try_next_event() {
            match event {
                ConversationEvent::ImageFetched { url, bytes } => {
                    self.images.store_fetched(ctx, &url, &bytes);
                }
                ConversationEvent::ImageFetchFailed { url } => self.images.mark_failed(&url),
                other => state.apply(other),
            }
        }
    }

    fn send_command(&self, command: ConversationCommand) {
        if let Some(handle) = &self.handle {
            handle.send(command);
        }
    }

    fn send_text(&mut self) {
        let Some(text) = self.state.as_mut().and_then(ConversationState::take_outgoing_text) else {
            return;
        };
        self.send_command(ConversationCommand::SendText(text));
    }

    fn pick_and_send_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        if self.state.as_mut().is_some_and(ConversationState::begin_upload) {
            self.send_command(ConversationCommand::SendImage(path));
        }
    }

    fn request_missing_images(&mut self) {
        for url in self.images.take_fetch_requests() {
            self.send_command(ConversationCommand::FetchImage(url));
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_conversation_events(ctx);

        let active = self.handle.as_ref().map(|h| h.counterpart().to_string());
        let signed_in_as = self.auth.as_ref().map(|a| a.username().to_string());

        egui::SidePanel::left("conversation_sidebar")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                let actions = sidebar::render(
                    ui,
                    &mut self.counterpart_input,
                    &self.recent,
                    active.as_deref(),
                    signed_in_as.as_deref(),
                );
                if let Some(counterpart) = actions.open_counterpart {
                    self.open_conversation(&counterpart);
                }
            });

        let mut input = input_bar::InputActions::default();
        let images = &mut self.images;
        let state = self.state.as_mut();

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(state) = state else {
                ui.heading("Forum messages");
                ui.separator();
                ui.label("Pick someone on the left to open a conversation.");
                return;
            };

            ui.heading(format!("Conversation with {}", state.counterpart()));
            ui.separator();

            if state.is_loading() {
                ui.spinner();
            } else if let Some(error) = state.blocking_error() {
                ui.colored_label(ui.visuals().error_fg_color, error);
            } else {
                chat_area::render(ui, state, images);
                ui.separator();
                let uploading = state.is_uploading();
                let sending = state.is_sending();
                input = input_bar::render(ui, &mut state.composer, uploading, sending);
            }
        });

        if input.send {
            self.send_text();
        }
        if input.pick_image {
            self.pick_and_send_image();
        }
        self.request_missing_images();

        // Poll results arrive on a channel, so keep frames coming.
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}
