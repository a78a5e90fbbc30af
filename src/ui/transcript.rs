use crate::chat::{Role, Turn};
use crate::markup::{Inline, List, Node, RenderedMarkup};
use crate::theme::Theme;
use eframe::egui::{self, text::LayoutJob, Align, Color32, FontSelection, RichText};

fn speaker_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant | Role::System => "Advisor",
    }
}

/// Text placed on the clipboard for a turn: markers stripped from rendered replies.
pub fn clipboard_text(turn: &Turn) -> String {
    match turn {
        Turn::User { .. } => turn.text().to_string(),
        Turn::Assistant { rendered, .. } | Turn::Notice { rendered, .. } => rendered.plain_text(),
    }
}

pub fn render_turn(ui: &mut egui::Ui, turn: &Turn, theme: &Theme) {
    ui.horizontal(|ui| {
        ui.label(
            RichText::new(speaker_label(turn.role()))
                .color(theme.text_muted)
                .size(12.0),
        );
        if ui
            .small_button("Copy")
            .on_hover_text("Copy message text")
            .clicked()
        {
            ui.ctx().copy_text(clipboard_text(turn));
        }
    });
    match turn {
        Turn::User { .. } => {
            theme.user_bubble_frame().show(ui, |ui| {
                // Literal text: user input is never read as markup.
                ui.label(RichText::new(turn.text()).color(theme.text_on_accent));
            });
        }
        Turn::Assistant { rendered, .. } => {
            theme.assistant_bubble_frame().show(ui, |ui| {
                render_markup(ui, rendered, theme.text_primary);
            });
        }
        Turn::Notice { rendered, .. } => {
            theme.notice_bubble_frame().show(ui, |ui| {
                render_markup(ui, rendered, theme.text_primary);
            });
        }
    }
    ui.add_space(theme.spacing_8);
}

pub fn render_markup(ui: &mut egui::Ui, markup: &RenderedMarkup, color: Color32) {
    let mut row: Vec<&Inline> = Vec::new();
    for node in &markup.nodes {
        match node {
            Node::Inline(inline) => row.push(inline),
            Node::LineBreak => {
                render_row(ui, None, &row, color);
                row.clear();
            }
            Node::List(list) => {
                if !row.is_empty() {
                    render_row(ui, None, &row, color);
                    row.clear();
                }
                render_list(ui, list, color);
            }
        }
    }
    if !row.is_empty() {
        render_row(ui, None, &row, color);
    }
}

fn render_list(ui: &mut egui::Ui, list: &List, color: Color32) {
    let ordered = list.is_ordered();
    let indent_id = ui.next_auto_id();
    ui.indent(indent_id, |ui| {
        for (index, item) in list.items.iter().enumerate() {
            let marker = if ordered {
                format!("{}. ", index + 1)
            } else {
                "• ".to_string()
            };
            let content: Vec<&Inline> = item.content.iter().collect();
            render_row(ui, Some(marker), &content, color);
        }
    });
}

fn render_row(ui: &mut egui::Ui, marker: Option<String>, inlines: &[&Inline], color: Color32) {
    if marker.is_none() && inlines.is_empty() {
        ui.add_space(ui.text_style_height(&egui::TextStyle::Body) * 0.5);
        return;
    }

    let style = ui.style().clone();
    let mut job = LayoutJob::default();
    if let Some(marker) = marker {
        RichText::new(marker)
            .color(color)
            .append_to(&mut job, &style, FontSelection::Default, Align::Center);
    }
    for inline in inlines {
        for span in inline.spans() {
            let mut text = RichText::new(span.text).color(color);
            if span.style.bold {
                text = text.strong();
            }
            if span.style.italic {
                text = text.italics();
            }
            text.append_to(&mut job, &style, FontSelection::Default, Align::Center);
        }
    }
    ui.label(job);
}
