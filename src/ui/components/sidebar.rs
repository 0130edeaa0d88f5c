use eframe::egui;

#[derive(Default)]
pub struct SidebarActions {
    pub open_counterpart: Option<String>,
}

pub fn render(
    ui: &mut egui::Ui,
    counterpart_input: &mut String,
    recent: &[String],
    active: Option<&str>,
    signed_in_as: Option<&str>,
) -> SidebarActions {
    let mut actions = SidebarActions::default();

    ui.heading("Messages");
    match signed_in_as {
        Some(username) => {
            ui.label(egui::RichText::new(format!("Signed in as {username}")).weak());
        }
        None => {
            ui.colored_label(
                ui.visuals().warn_fg_color,
                "Not signed in. Run `forum_chat session set` and restart.",
            );
        }
    }
    ui.separator();

    ui.label("Open conversation with:");
    let response = ui.text_edit_singleline(counterpart_input);
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
    if (ui.button("Open").clicked() || submitted) && !counterpart_input.trim().is_empty() {
        actions.open_counterpart = Some(counterpart_input.trim().to_string());
        counterpart_input.clear();
    }

    ui.separator();
    ui.label("Recent:");

    if recent.is_empty() {
        ui.label(egui::RichText::new("No conversations opened yet").weak());
        return actions;
    }

    for counterpart in recent {
        let selected = active == Some(counterpart.as_str());
        if ui.selectable_label(selected, counterpart.as_str()).clicked() && !selected {
            actions.open_counterpart = Some(counterpart.clone());
        }
    }

    actions
}
