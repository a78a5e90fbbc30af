use eframe::egui::{self, Color32, CornerRadius, FontId, Frame, Margin, Stroke, TextStyle};

#[derive(Debug, Clone)]
pub struct Theme {
    pub surface_0: Color32,
    pub surface_1: Color32,
    pub surface_2: Color32,
    pub surface_3: Color32,
    pub accent_primary: Color32,
    pub accent_muted: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub danger: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub text_on_accent: Color32,
    pub selected_tint: Color32,
    pub spacing_4: f32,
    pub spacing_8: f32,
    pub spacing_12: f32,
    pub radius_10: u8,
    pub radius_12: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            surface_0: Color32::from_rgb(0x14, 0x11, 0x12),
            surface_1: Color32::from_rgb(0x1C, 0x18, 0x1A),
            surface_2: Color32::from_rgb(0x26, 0x20, 0x23),
            surface_3: Color32::from_rgb(0x30, 0x28, 0x2C),
            accent_primary: Color32::from_rgb(0xC8, 0x9B, 0x3C),
            accent_muted: Color32::from_rgb(0x8E, 0x6C, 0x2A),
            success: Color32::from_rgb(0x22, 0xC5, 0x5E),
            warning: Color32::from_rgb(0xF5, 0x9E, 0x0B),
            danger: Color32::from_rgb(0xEF, 0x44, 0x44),
            text_primary: Color32::from_rgb(0xF2, 0xEC, 0xE6),
            text_muted: Color32::from_rgb(0x9E, 0x94, 0x8E),
            text_on_accent: Color32::from_rgb(0x1A, 0x14, 0x0C),
            selected_tint: Color32::from_rgba_premultiplied(0xC8, 0x9B, 0x3C, 40),
            spacing_4: 4.0,
            spacing_8: Self::P8,
            spacing_12: Self::P12,
            radius_10: 10,
            radius_12: Self::R12,
        }
    }
}

impl Theme {
    pub const R12: u8 = 12;
    pub const P8: f32 = 8.0;
    pub const P12: f32 = 12.0;

    pub fn apply_visuals(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = self.surface_1;
        visuals.extreme_bg_color = self.surface_0;
        visuals.override_text_color = Some(self.text_primary);
        visuals.widgets.noninteractive.bg_fill = self.surface_2;
        visuals.widgets.noninteractive.weak_bg_fill = self.surface_2;
        visuals.widgets.noninteractive.bg_stroke = Stroke::NONE;
        visuals.widgets.inactive.bg_fill = self.surface_2;
        visuals.widgets.inactive.weak_bg_fill = self.surface_3;
        visuals.widgets.inactive.bg_stroke = Stroke::NONE;
        visuals.widgets.hovered.bg_fill = self.surface_3;
        visuals.widgets.hovered.weak_bg_fill = self.surface_3;
        visuals.widgets.hovered.bg_stroke = Stroke::NONE;
        visuals.widgets.active.bg_fill = self.accent_muted;
        visuals.widgets.active.weak_bg_fill = self.accent_muted;
        visuals.widgets.active.bg_stroke = Stroke::NONE;
        visuals.selection.bg_fill = self.accent_muted;
        visuals.hyperlink_color = self.accent_primary;
        visuals.window_fill = self.surface_1;
        visuals.window_stroke = Stroke::NONE;
        visuals.window_corner_radius = CornerRadius::same(self.radius_10);
        let mut style = (*ctx.style()).clone();
        style.visuals = visuals;
        style.spacing.item_spacing = egui::vec2(10.0, 8.0);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.text_styles.insert(TextStyle::Heading, FontId::proportional(17.0));
        style.text_styles.insert(TextStyle::Body, FontId::proportional(14.0));
        style.text_styles.insert(TextStyle::Small, FontId::proportional(12.0));
        ctx.set_style(style);
    }

    pub fn panel_frame(&self, fill: Color32, inner_padding: i8) -> Frame {
        Frame::new()
            .fill(fill)
            .inner_margin(Margin::same(inner_padding))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::NONE)
    }

    pub fn card_frame(&self, selected: bool) -> Frame {
        let frame = self.panel_frame(self.surface_2, self.spacing_12 as i8);
        if selected {
            frame.stroke(Stroke::new(1.5, self.accent_primary))
        } else {
            frame
        }
    }

    pub fn chip_frame(&self) -> Frame {
        Frame::new()
            .fill(self.selected_tint)
            .inner_margin(Margin::symmetric(self.spacing_8 as i8, self.spacing_4 as i8))
            .corner_radius(CornerRadius::same(self.radius_10))
    }

    pub fn user_bubble_frame(&self) -> Frame {
        self.panel_frame(self.accent_muted, self.spacing_8 as i8)
    }

    pub fn assistant_bubble_frame(&self) -> Frame {
        self.panel_frame(self.surface_2, self.spacing_8 as i8)
    }

    pub fn notice_bubble_frame(&self) -> Frame {
        self.panel_frame(self.surface_3, self.spacing_8 as i8)
    }

    pub fn composer_frame(&self) -> Frame {
        Frame::new()
            .fill(self.surface_2)
            .inner_margin(Margin::symmetric(self.spacing_12 as i8, 10))
            .corner_radius(CornerRadius::same(self.radius_12))
            .stroke(Stroke::NONE)
    }
}
