use eframe::egui;

#[derive(Default)]
pub struct InputActions {
    pub send: bool,
    pub pick_image: bool,
}

/// Composer row. Enter sends, Shift+Enter inserts a newline.
pub fn render(
    ui: &mut egui::Ui,
    composer: &mut String,
    uploading: bool,
    sending: bool,
) -> InputActions {
    let mut actions = InputActions::default();
    let editor_id = ui.make_persistent_id("composer");

    let focused = ui.memory(|memory| memory.has_focus(editor_id));
    let enter_pressed = focused
        && !ui.input(|input| input.modifiers.shift)
        && ui.input_mut(|input| input.consume_key(egui::Modifiers::NONE, egui::Key::Enter));

    ui.horizontal(|ui| {
        let editor_width = (ui.available_width() - 170.0).max(120.0);
        ui.add_enabled(
            !uploading,
            egui::TextEdit::multiline(composer)
                .id(editor_id)
                .desired_rows(1)
                .desired_width(editor_width)
                .hint_text("Type your message..."),
        );

        let upload_label = if uploading { "Uploading..." } else { "🖼 Image" };
        if ui
            .add_enabled(!uploading, egui::Button::new(upload_label))
            .on_hover_text("Upload image")
            .clicked()
        {
            actions.pick_image = true;
        }

        let can_send = !uploading && !sending && !composer.trim().is_empty();
        let send_label = if sending { "Sending..." } else { "Send" };
        if ui.add_enabled(can_send, egui::Button::new(send_label)).clicked() {
            actions.send = true;
        }
    });

    if enter_pressed {
        actions.send = true;
    }

    actions
}
