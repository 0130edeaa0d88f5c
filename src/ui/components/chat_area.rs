use chrono::Local;
use eframe::egui;

use crate::conversation::{
    ConversationMessage, ImageRef, MessageContent, MessageSide, TextSegment, format_timestamp,
    initials, linkify,
};
use crate::ui::images::{ImageCache, ImageLookup};
use crate::ui::state::ConversationState;

/// Space left below the list for the jump button and composer.
const COMPOSER_RESERVE: f32 = 110.0;
const BUBBLE_WIDTH_RATIO: f32 = 0.72;

pub fn render(ui: &mut egui::Ui, state: &mut ConversationState, images: &mut ImageCache) {
    let now = Local::now();
    let scroll_request = state.scroll.take_scroll_request();
    let list_height = (ui.available_height() - COMPOSER_RESERVE).max(120.0);

    let output = egui::ScrollArea::vertical()
        .id_salt("conversation_messages")
        .auto_shrink([false, false])
        .max_height(list_height)
        .show(ui, |ui| {
            let bubble_width = ui.available_width() * BUBBLE_WIDTH_RATIO;

            if state.messages().is_empty() {
                ui.label(egui::RichText::new("No messages yet. Say hi!").weak());
            }

            for group in state.day_groups(&now) {
                day_separator(ui, &group.label);
                for message in group.messages {
                    render_message(ui, message, state.side_of(message), images, bubble_width);
                    ui.add_space(6.0);
                }
            }

            let anchor = ui.allocate_response(egui::Vec2::ZERO, egui::Sense::hover());
            if scroll_request {
                anchor.scroll_to_me(Some(egui::Align::BOTTOM));
            }
        });

    state.scroll.update_position(
        output.content_size.y,
        output.state.offset.y,
        output.inner_rect.height(),
    );

    if state.scroll.show_jump_button() {
        ui.vertical_centered(|ui| {
            if ui.button("⬇ Jump to latest").clicked() {
                state.scroll.jump_to_bottom();
            }
        });
    }
}

fn day_separator(ui: &mut egui::Ui, label: &str) {
    ui.add_space(4.0);
    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new(label).small().weak());
    });
    ui.separator();
}

fn render_message(
    ui: &mut egui::Ui,
    message: &ConversationMessage,
    side: MessageSide,
    images: &mut ImageCache,
    bubble_width: f32,
) {
    let own = side == MessageSide::Own;
    let layout = if own {
        egui::Layout::right_to_left(egui::Align::Max)
    } else {
        egui::Layout::left_to_right(egui::Align::Max)
    };

    ui.with_layout(layout, |ui| {
        avatar(ui, &message.sender, own);

        let dark = ui.visuals().dark_mode;
        egui::Frame::new()
            .fill(bubble_fill(own, dark))
            .corner_radius(10)
            .inner_margin(egui::Margin::same(8))
            .show(ui, |ui| {
                ui.set_max_width(bubble_width);
                ui.vertical(|ui| {
                    render_content(ui, message, images, bubble_width);
                    if let Some(created_at) = &message.created_at {
                        ui.label(
                            egui::RichText::new(format_timestamp(created_at, &Local))
                                .small()
                                .weak(),
                        );
                    }
                });
            });
    });
}

fn avatar(ui: &mut egui::Ui, sender: &str, own: bool) {
    let fill = if own {
        egui::Color32::from_rgb(0x19, 0x76, 0xd2)
    } else {
        egui::Color32::from_rgb(0x2e, 0x7d, 0x32)
    };

    egui::Frame::new()
        .fill(fill)
        .corner_radius(14)
        .inner_margin(egui::Margin::same(6))
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(initials(sender))
                    .strong()
                    .color(egui::Color32::WHITE),
            );
        });
}

fn bubble_fill(own: bool, dark: bool) -> egui::Color32 {
    match (own, dark) {
        (true, false) => egui::Color32::from_rgb(0xd9, 0xed, 0xff),
        (true, true) => egui::Color32::from_rgb(0x29, 0x4b, 0x63),
        (false, false) => egui::Color32::from_rgb(0xde, 0xf9, 0xe4),
        (false, true) => egui::Color32::from_rgb(0x2b, 0x4e, 0x33),
    }
}

fn render_content(
    ui: &mut egui::Ui,
    message: &ConversationMessage,
    images: &mut ImageCache,
    max_width: f32,
) {
    match &message.content {
        MessageContent::Text(text) => {
            ui.horizontal_wrapped(|ui| {
                ui.spacing_mut().item_spacing.x = 0.0;
                for segment in linkify(text) {
                    match segment {
                        TextSegment::Plain(plain) => {
                            ui.label(plain);
                        }
                        TextSegment::Link { label, href } => {
                            ui.hyperlink_to(label, href);
                        }
                    }
                }
            });
        }
        MessageContent::Image(image) => match images.lookup(ui.ctx(), message.id, image) {
            ImageLookup::Ready(texture) => {
                ui.add(egui::Image::new(texture).max_width(max_width));
            }
            ImageLookup::Loading => {
                ui.spinner();
            }
            ImageLookup::Unavailable => match image {
                ImageRef::Remote(url) => {
                    ui.hyperlink_to("🖼 Open image", url);
                }
                ImageRef::Inline { mime, .. } => {
                    ui.label(egui::RichText::new(format!("[{mime} image]")).weak());
                }
            },
        },
    }
}
