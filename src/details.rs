use chrono::Local;

use crate::intake;
use crate::model::{Marker, MarkerDetails, MarkerId};

const PHOTO_URL_FIELD: &str = "marker_photo_url";

pub enum DetailsAction {
    Save(MarkerDetails),
    Delete,
    Close,
}

/// Edit buffers for the selected marker. They are refilled from the marker
/// whenever the selection moves to a different one.
#[derive(Debug, Default)]
pub struct DetailsForm {
    marker: Option<MarkerId>,
    description: String,
    photo: String,
}

impl DetailsForm {
    pub fn sync(&mut self, marker: &Marker) {
        if self.marker == Some(marker.id) {
            return;
        }
        let details = marker.details();
        self.marker = Some(marker.id);
        self.description = details.description.unwrap_or_default();
        self.photo = details.attachment.unwrap_or_default();
    }

    /// Forgets the buffers, so the next `sync` reloads from the marker even
    /// if it is the same one.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The whole field set; blank fields become `None`.
    pub fn submission(&self) -> MarkerDetails {
        MarkerDetails {
            description: non_blank(&self.description),
            attachment: non_blank(&self.photo),
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, marker: &Marker) -> Option<DetailsAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading("Marker Details");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("✖").on_hover_text("Close").clicked() {
                    action = Some(DetailsAction::Close);
                }
            });
        });
        ui.separator();

        ui.label("Photo");
        if !self.photo.trim().is_empty() {
            ui.add(
                egui::Image::new(intake::photo_source(self.photo.trim()))
                    .max_height(192.0)
                    .maintain_aspect_ratio(true),
            );
            if ui.button("🗑 Remove photo").clicked() {
                self.photo.clear();
            }
        }
        ui.group(|ui| {
            ui.label("Upload a photo or paste a URL");
            ui.add(
                egui::TextEdit::singleline(&mut self.photo)
                    .id(egui::Id::new(PHOTO_URL_FIELD))
                    .hint_text("Image URL")
                    .desired_width(f32::INFINITY),
            );
            if ui.button("Browse…").clicked() {
                if let Some(path) = intake::pick_photo() {
                    self.photo = intake::photo_uri(&path);
                }
            }
        });

        ui.add_space(8.0);
        ui.label("Description");
        ui.add(
            egui::TextEdit::multiline(&mut self.description)
                .desired_rows(4)
                .desired_width(f32::INFINITY)
                .hint_text("Add notes about this location..."),
        );

        if let Some(at) = marker.last_modified {
            ui.weak(format!(
                "Last modified {}",
                at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            ));
        }
        ui.weak(format!("Position {:.1}%, {:.1}%", marker.x, marker.y));

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Save Changes").clicked() {
                action = Some(DetailsAction::Save(self.submission()));
            }
            if ui
                .button(egui::RichText::new("Delete").color(egui::Color32::from_rgb(239, 68, 68)))
                .clicked()
            {
                action = Some(DetailsAction::Delete);
            }
        });

        action
    }
}

fn non_blank(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}
