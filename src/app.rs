use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::details::{DetailsAction, DetailsForm};
use crate::intake;
use crate::model::{ImageRef, MarkerId};
use crate::store::{AnnotationStore, StoreError};
use crate::viewer::{FloorPlanViewer, ViewerEvent};

pub struct FloorPlanApp {
    store: AnnotationStore,
    viewer: FloorPlanViewer,
    details: DetailsForm,
    status: Option<String>,
}

impl FloorPlanApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config, initial: Option<PathBuf>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let mut app = Self {
            store: AnnotationStore::new(config.selection_on_delete),
            viewer: FloorPlanViewer::new(&config),
            details: DetailsForm::default(),
            status: None,
        };
        if let Some(path) = initial {
            app.open_path(&cc.egui_ctx, &path);
        }
        app
    }

    fn open_path(&mut self, ctx: &egui::Context, path: &Path) {
        match intake::from_path(path) {
            Ok((image, name)) => self.open(ctx, image, name),
            Err(err) => self.report(err),
        }
    }

    /// Decodes first so a broken file leaves the current plan in place.
    fn open(&mut self, ctx: &egui::Context, image: ImageRef, name: String) {
        match intake::render(&image) {
            Ok(pixels) => {
                let plan = self.store.load_floor_plan(image, name).id;
                self.viewer.set_image(ctx, plan, &pixels);
                self.status = None;
            }
            Err(err) => self.report(err.context(format!("opening {name}"))),
        }
    }

    fn report(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        self.status = Some(format!("{err:#}"));
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        match intake::from_dropped(&dropped) {
            Some((image, name)) => self.open(ctx, image, name),
            None => {
                log::warn!("none of {} dropped files is a supported floor plan", dropped.len());
                self.status = Some("Unsupported file: expected JPEG, PNG, GIF or PDF".into());
            }
        }
    }

    fn apply_viewer_event(&mut self, event: ViewerEvent) {
        let result = match event {
            ViewerEvent::Add(at) => self.store.add_marker(at.x, at.y).map(|_| ()),
            ViewerEvent::Select(id) => {
                self.store.select_marker(Some(id));
                Ok(())
            }
            ViewerEvent::Move { id, to } => self.store.move_marker(id, to.x, to.y),
        };
        ignore_store_error(result);
    }

    fn apply_details_action(&mut self, id: MarkerId, action: DetailsAction) {
        let result = match action {
            DetailsAction::Save(details) => self.store.update_marker_details(id, details).map(|_| ()),
            DetailsAction::Delete => self.store.delete_marker(id).map(|_| ()),
            DetailsAction::Close => {
                self.close_details();
                Ok(())
            }
        };
        ignore_store_error(result);
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (delete, escape) =
            ctx.input(|i| (i.key_pressed(egui::Key::Delete), i.key_pressed(egui::Key::Escape)));
        if delete {
            if let Some(id) = self.store.selected_id() {
                ignore_store_error(self.store.delete_marker(id).map(|_| ()));
            }
        }
        if escape {
            if self.viewer.is_adding_marker() {
                self.viewer.set_adding_marker(false);
            } else {
                self.close_details();
            }
        }
    }

    /// Drops the selection together with any unsaved edits in the panel.
    fn close_details(&mut self) {
        self.store.select_marker(None);
        self.details.clear();
    }

    fn upload_prompt(ui: &mut egui::Ui) -> bool {
        let mut clicked = false;
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.3);
            clicked = ui
                .add(
                    egui::Button::new(
                        egui::RichText::new("Drag & drop a floor plan, or click to select")
                            .size(18.0),
                    )
                    .min_size(egui::vec2(420.0, 160.0)),
                )
                .clicked();
            ui.add_space(8.0);
            ui.weak("Supports JPEG, PNG, GIF, and PDF files");
        });
        clicked
    }
}

/// Rejected transitions leave the store as it was; the UI only logs them.
fn ignore_store_error(result: Result<(), StoreError>) {
    if let Err(err) = result {
        log::debug!("ignored: {err}");
    }
}

fn drop_overlay(ctx: &egui::Context) {
    if ctx.input(|i| i.raw.hovered_files.is_empty()) {
        return;
    }
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("drop_overlay"),
    ));
    let rect = ctx.screen_rect();
    painter.rect_filled(rect, 0.0, egui::Color32::from_black_alpha(160));
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        "Drop the floor plan here",
        egui::FontId::proportional(24.0),
        egui::Color32::WHITE,
    );
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for FloorPlanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.handle_keys(ctx);

        let mut open_dialog = false;
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Floor Plan Annotator");
                ui.separator();
                if ui.button("Open…").clicked() {
                    open_dialog = true;
                }
                if let Some(plan) = self.store.floor_plan() {
                    ui.label(&plan.name);
                    ui.label(format!("{} markers", plan.markers.len()));
                    ui.separator();
                    self.viewer.toolbar(ui);
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(239, 68, 68), status);
                }
            });
        });

        if let Some(marker) = self.store.selected().cloned() {
            let mut action = None;
            egui::SidePanel::right("marker_details")
                .exact_width(384.0)
                .show(ctx, |ui| {
                    self.details.sync(&marker);
                    action = self.details.show(ui, &marker);
                });
            if let Some(action) = action {
                self.apply_details_action(marker.id, action);
            }
        } else {
            self.details.clear();
        }

        let mut events = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| match self.store.floor_plan() {
            Some(plan) => {
                events = self.viewer.show(ui, plan, self.store.selected_id());
            }
            None => {
                if Self::upload_prompt(ui) {
                    open_dialog = true;
                }
            }
        });
        for event in events {
            self.apply_viewer_event(event);
        }

        if open_dialog {
            if let Some(path) = intake::pick_floor_plan() {
                self.open_path(ctx, &path);
            }
        }

        drop_overlay(ctx);
    }
}
