use crate::catalog::selection::SelectionSet;
use crate::catalog::{Product, PLACEHOLDER_IMAGE};
use crate::theme::Theme;
use crate::ui::event::UiAction;
use eframe::egui::{self, RichText};
use std::path::Path;

const CARD_IMAGE_SIZE: f32 = 72.0;

// Unreadable files (corrupt, unsupported format) fall back to the placeholder too.
fn image_uri(ui: &egui::Ui, resolved: &Path, image_root: &Path) -> String {
    let uri = format!("file://{}", resolved.display());
    match ui.ctx().try_load_image(&uri, egui::load::SizeHint::default()) {
        Ok(_) => uri,
        Err(err) => {
            tracing::debug!(%uri, error = %err, "product image unreadable");
            format!("file://{}", image_root.join(PLACEHOLDER_IMAGE).display())
        }
    }
}

pub fn render_product_card(
    ui: &mut egui::Ui,
    product: &Product,
    selected: bool,
    preview_chars: usize,
    image_root: &Path,
    theme: &Theme,
    emit: &mut dyn FnMut(UiAction),
) {
    let frame = theme.card_frame(selected);
    frame.show(ui, |ui| {
        ui.set_width(ui.available_width());
        let uri = image_uri(ui, &product.resolve_image(image_root), image_root);
        ui.add(
            egui::Image::new(uri)
                .fit_to_exact_size(egui::vec2(CARD_IMAGE_SIZE, CARD_IMAGE_SIZE))
                .maintain_aspect_ratio(true),
        )
        .on_hover_text(product.image_or_placeholder());
        ui.label(
            RichText::new(product.display_name())
                .color(theme.text_primary)
                .size(15.0)
                .strong(),
        );
        ui.label(
            RichText::new(product.display_category())
                .color(theme.accent_primary)
                .size(12.0),
        );
        ui.add_space(theme.spacing_4);
        ui.label(
            RichText::new(product.short_description(preview_chars))
                .color(theme.text_muted)
                .size(13.0),
        );
        ui.add_space(theme.spacing_8);

        let label = if selected { "Remove" } else { "Select" };
        let button = if selected {
            egui::Button::new(RichText::new(label).color(theme.text_primary))
        } else {
            egui::Button::new(RichText::new(label).color(theme.text_on_accent))
                .fill(theme.accent_primary)
        };
        if ui.add(button).clicked() {
            emit(UiAction::ToggleProduct {
                product_id: product.id,
            });
        }
    });
}

pub fn selection_heading(selection: &SelectionSet) -> String {
    match selection.len() {
        0 => "Selected Products".to_string(),
        count => format!("Selected Products ({count})"),
    }
}

pub fn render_selected_chips(
    ui: &mut egui::Ui,
    selection: &SelectionSet,
    theme: &Theme,
    emit: &mut dyn FnMut(UiAction),
) {
    if selection.is_empty() {
        ui.label(RichText::new("No products selected yet.").color(theme.text_muted));
        return;
    }

    for product in selection.members() {
        theme.chip_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(product.display_name()).color(theme.text_primary));
                if ui
                    .small_button("✕")
                    .on_hover_text("Remove product")
                    .clicked()
                {
                    emit(UiAction::ToggleProduct {
                        product_id: product.id,
                    });
                }
            });
        });
    }
}
