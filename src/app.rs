use crate::catalog::selection::{SelectionSet, ToggleOutcome};
use crate::catalog::{CatalogIndex, CatalogProvider, CatalogState};
use crate::chat::transport::ChatTransport;
use crate::chat::{Conversation, CycleState, PendingRequest, SubmitError};
use crate::config::AdvisorConfig;
use crate::event::AppEvent;
use crate::theme::Theme;
use crate::ui::event::UiAction;
use crate::ui::{products, transcript};
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;

pub struct AdvisorApp {
    rx: Receiver<AppEvent>,
    tx: Sender<AppEvent>,
    runtime_handle: Handle,
    transport: Arc<dyn ChatTransport>,
    catalog_provider: Arc<dyn CatalogProvider>,
    config: AdvisorConfig,
    theme: Theme,
    catalog: CatalogIndex,
    selection: SelectionSet,
    conversation: Conversation,
    search_term: String,
    input_buffer: String,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
}

impl AdvisorApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        tx: Sender<AppEvent>,
        runtime_handle: Handle,
        transport: Arc<dyn ChatTransport>,
        catalog_provider: Arc<dyn CatalogProvider>,
        config: AdvisorConfig,
    ) -> Self {
        let mut app = Self {
            rx,
            tx,
            runtime_handle,
            transport,
            catalog_provider,
            config,
            theme: Theme::default(),
            catalog: CatalogIndex::new(),
            selection: SelectionSet::new(),
            conversation: Conversation::new(),
            search_term: String::new(),
            input_buffer: String::new(),
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
        };
        app.start_catalog_load();
        app
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "routine_advisor::diagnostics", "{message}");
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message));
    }

    fn start_catalog_load(&mut self) {
        let provider = Arc::clone(&self.catalog_provider);
        let tx = self.tx.clone();
        self.log_diagnostic(format!("loading catalog from {}", provider.source_ref()));
        self.runtime_handle.spawn_blocking(move || {
            let _ = tx.send(AppEvent::CatalogLoaded(provider.load_products()));
        });
    }

    fn dispatch(&mut self, pending: PendingRequest) {
        self.log_diagnostic(format!(
            "request sent with {} messages in history",
            self.conversation.history().len()
        ));
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let outcome = transport.complete(&pending.messages).await;
            let _ = tx.send(AppEvent::ChatCompleted(outcome));
        });
        self.scroll_to_bottom = true;
    }

    fn submit_prompt(&mut self) {
        match self.conversation.submit_user_text(&self.input_buffer) {
            Ok(pending) => {
                self.input_buffer.clear();
                self.dispatch(pending);
            }
            Err(SubmitError::EmptyInput) => {}
            Err(err) => self.log_diagnostic(format!("prompt not sent: {err}")),
        }
    }

    fn apply_action(&mut self, action: UiAction) {
        tracing::debug!("{}", action.to_log_line());
        match action {
            UiAction::ToggleProduct { product_id } => {
                if self.selection.toggle(product_id, &self.catalog) == ToggleOutcome::Ignored {
                    self.log_diagnostic(format!("stale toggle ignored for product {product_id}"));
                }
            }
            UiAction::GenerateRoutine => {
                match self
                    .conversation
                    .submit_selection_prompt(self.selection.members())
                {
                    Ok(pending) => self.dispatch(pending),
                    Err(SubmitError::EmptyInput) => {}
                    Err(err) => self.log_diagnostic(format!("routine request not sent: {err}")),
                }
            }
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CatalogLoaded(outcome) => {
                self.catalog.install(outcome);
                let summary = match self.catalog.state() {
                    CatalogState::Ready => format!("catalog ready: {} products", self.catalog.len()),
                    CatalogState::Failed(err) => format!("catalog load failed: {err}"),
                    CatalogState::Loading => "catalog still loading".to_string(),
                };
                let dropped: Vec<String> = self
                    .catalog
                    .diagnostics()
                    .iter()
                    .map(|diagnostic| diagnostic.to_log_line())
                    .collect();
                self.log_diagnostic(summary);
                for line in dropped {
                    self.log_diagnostic(line);
                }
            }
            AppEvent::ChatCompleted(outcome) => {
                if self.conversation.complete_cycle(outcome).is_none() {
                    self.log_diagnostic("completion ignored: no request outstanding");
                }
                self.scroll_to_bottom = true;
            }
        }
    }

    fn catalog_label(&self) -> (String, Color32) {
        match self.catalog.state() {
            CatalogState::Loading => ("Loading catalog...".to_string(), self.theme.warning),
            CatalogState::Ready if self.catalog.is_empty() => {
                ("Catalog is empty".to_string(), self.theme.warning)
            }
            CatalogState::Ready => (
                format!("{} products", self.catalog.len()),
                self.theme.success,
            ),
            CatalogState::Failed(_) => ("Catalog unavailable".to_string(), self.theme.danger),
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let (catalog_label, catalog_color) = self.catalog_label();
        let (chat_label, chat_color) = match self.conversation.state() {
            CycleState::AwaitingResponse => ("Waiting for response...", self.theme.warning),
            CycleState::Idle => ("Ready", self.theme.success),
        };
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Routine Advisor");
                ui.separator();
                ui.label(RichText::new(catalog_label).color(catalog_color));
                ui.separator();
                ui.label(RichText::new(chat_label).color(chat_color));
            });
        });
    }

    fn render_catalog_panel(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();
        egui::SidePanel::left("catalog_panel")
            .resizable(true)
            .default_width(380.0)
            .show(ctx, |ui| {
                ui.heading("Products");
                ui.add(
                    egui::TextEdit::singleline(&mut self.search_term)
                        .desired_width(f32::INFINITY)
                        .hint_text("Search products by name, brand, category..."),
                );
                ui.separator();

                ScrollArea::vertical()
                    .id_salt("product_grid")
                    .show(ui, |ui| match self.catalog.state() {
                        CatalogState::Loading => {
                            ui.label(RichText::new("Loading products...").color(self.theme.text_muted));
                        }
                        CatalogState::Failed(err) => {
                            ui.label(
                                RichText::new("Failed to load products. Please restart the app.")
                                    .color(self.theme.danger),
                            );
                            ui.label(RichText::new(err.to_string()).color(self.theme.text_muted).size(12.0));
                        }
                        CatalogState::Ready => {
                            let results = self.catalog.search(&self.search_term);
                            if results.is_empty() {
                                ui.label(
                                    RichText::new("No products found matching your search.")
                                        .color(self.theme.text_muted),
                                );
                            }
                            for product in &results {
                                products::render_product_card(
                                    ui,
                                    product,
                                    self.selection.is_selected(product.id),
                                    self.config.description_preview_chars,
                                    &self.config.image_root,
                                    &self.theme,
                                    &mut |action| actions.push(action),
                                );
                                ui.add_space(self.theme.spacing_8);
                            }
                        }
                    });
            });

        for action in actions {
            self.apply_action(action);
        }
    }

    fn render_selection_panel(&mut self, ctx: &egui::Context) {
        let mut actions = Vec::new();
        egui::SidePanel::right("selection_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading(products::selection_heading(&self.selection));
                ui.separator();
                ScrollArea::vertical()
                    .id_salt("selected_products")
                    .max_height((ui.available_height() - 60.0).max(80.0))
                    .show(ui, |ui| {
                        products::render_selected_chips(
                            ui,
                            &self.selection,
                            &self.theme,
                            &mut |action| actions.push(action),
                        );
                    });
                ui.separator();

                let label = if self.selection.is_empty() {
                    RichText::new("Select Products First").color(self.theme.text_muted)
                } else {
                    RichText::new("✨ Generate Routine").color(self.theme.text_on_accent)
                };
                let enabled =
                    !self.selection.is_empty() && !self.conversation.is_awaiting_response();
                let button = egui::Button::new(label)
                    .fill(self.theme.accent_primary)
                    .min_size(egui::vec2(ui.available_width(), 36.0));
                if ui.add_enabled(enabled, button).clicked() {
                    actions.push(UiAction::GenerateRoutine);
                }
            });

        for action in actions {
            self.apply_action(action);
        }
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Chat");
            ui.separator();

            let transcript_height = (ui.available_height() - 170.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("chat_transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for turn in self.conversation.turns() {
                        transcript::render_turn(ui, turn, &self.theme);
                    }

                    if self.conversation.is_awaiting_response() {
                        ui.label(RichText::new("Thinking...").color(self.theme.text_muted).italics());
                    }

                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            self.scroll_to_bottom = false;

            ui.separator();
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in &self.diagnostics_log {
                                ui.label(RichText::new(entry).color(self.theme.text_muted).size(12.0));
                            }
                        });
                });

            ui.separator();
            let awaiting = self.conversation.is_awaiting_response();
            let hint = if awaiting {
                "Waiting for response..."
            } else {
                "Ask me about products or routines..."
            };

            let mut send_now = false;
            self.theme.composer_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        !awaiting,
                        egui::TextEdit::singleline(&mut self.input_buffer)
                            .desired_width(ui.available_width() - 80.0)
                            .hint_text(hint),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }

                    let clicked = ui
                        .add_enabled(
                            !awaiting && !self.input_buffer.trim().is_empty(),
                            egui::Button::new("Send"),
                        )
                        .clicked();
                    send_now |= clicked;
                });
            });

            if send_now {
                self.submit_prompt();
            }
        });
    }
}

impl eframe::App for AdvisorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        if self.conversation.is_awaiting_response() || *self.catalog.state() == CatalogState::Loading
        {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        self.render_top_bar(ctx);
        self.render_catalog_panel(ctx);
        self.render_selection_panel(ctx);
        self.render_chat_panel(ctx);
    }
}
