use image::RgbaImage;

use crate::config::Config;
use crate::intake;
use crate::mapper::{
    drag_delta_to_percent, percent_to_pointer, pointer_to_percent, DragReference, Percent,
};
use crate::model::{FloorPlan, Marker, MarkerId, PlanId};

const PIN_COLOR: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 120, 255);

// ── Pan & zoom ──────────────────────────────────────────────────────────────

/// Display transform of the plan inside the canvas. Markers are stored in
/// percentages, so nothing here ever reaches the store.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pan: egui::Vec2,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    step: f32,
}

impl View {
    pub fn new(config: &Config) -> Self {
        let mut view = Self {
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            step: config.zoom_step,
        };
        view.reset();
        view
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn reset(&mut self) {
        self.pan = egui::Vec2::ZERO;
        self.zoom = 1.0_f32.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn pan_by(&mut self, delta: egui::Vec2) {
        self.pan += delta;
    }

    /// Scales by `factor`, keeping the point at `anchor` (relative to the
    /// canvas center) fixed on screen.
    pub fn zoom_by(&mut self, factor: f32, anchor: egui::Vec2) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        let rel = anchor - self.pan;
        self.pan -= rel * (new_zoom / self.zoom - 1.0);
        self.zoom = new_zoom;
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.step, egui::Vec2::ZERO);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / self.step, egui::Vec2::ZERO);
    }

    /// Scale at zoom 1: the plan fits the canvas but is never enlarged.
    fn fit_scale(image_size: egui::Vec2, canvas_rect: egui::Rect) -> f32 {
        if image_size.x <= 0.0 || image_size.y <= 0.0 {
            return 1.0;
        }
        (canvas_rect.width() / image_size.x)
            .min(canvas_rect.height() / image_size.y)
            .min(1.0)
    }

    pub fn image_rect(&self, canvas_rect: egui::Rect, image_size: egui::Vec2) -> egui::Rect {
        let scale = Self::fit_scale(image_size, canvas_rect) * self.zoom;
        egui::Rect::from_center_size(canvas_rect.center() + self.pan, image_size * scale)
    }
}

// ── Viewer ──────────────────────────────────────────────────────────────────

/// What the user did to the plan this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    Add(Percent),
    Select(MarkerId),
    Move { id: MarkerId, to: Percent },
}

#[derive(Clone, Debug)]
enum DragState {
    None,
    Moving { id: MarkerId, offset: egui::Vec2 },
}

pub struct FloorPlanViewer {
    view: View,
    texture: Option<(PlanId, egui::TextureHandle)>,
    image_size: egui::Vec2,
    adding_marker: bool,
    drag: DragState,
    drag_reference: DragReference,
    pin_size: f32,
}

impl FloorPlanViewer {
    pub fn new(config: &Config) -> Self {
        Self {
            view: View::new(config),
            texture: None,
            image_size: egui::vec2(800.0, 600.0),
            adding_marker: false,
            drag: DragState::None,
            drag_reference: config.drag_reference,
            pin_size: config.pin_size,
        }
    }

    /// Uploads the plan's pixels and resets the view for a new plan. Plans
    /// larger than the GPU allows are uploaded downscaled but keep their
    /// original layout size.
    pub fn set_image(&mut self, ctx: &egui::Context, plan: PlanId, pixels: &RgbaImage) {
        let max_side = ctx.input(|i| i.max_texture_side);
        let fitted = intake::fit_within(pixels, max_side);
        let upload = fitted.as_ref().unwrap_or(pixels);

        let size = [upload.width() as usize, upload.height() as usize];
        let color_image =
            egui::ColorImage::from_rgba_unmultiplied(size, upload.as_flat_samples().as_slice());
        let texture = ctx.load_texture("floor_plan", color_image, egui::TextureOptions::LINEAR);
        self.texture = Some((plan, texture));
        self.image_size = egui::vec2(pixels.width() as f32, pixels.height() as f32);
        self.view.reset();
        self.adding_marker = false;
        self.drag = DragState::None;
    }

    pub fn is_adding_marker(&self) -> bool {
        self.adding_marker
    }

    pub fn set_adding_marker(&mut self, adding: bool) {
        self.adding_marker = adding;
    }

    pub fn toolbar(&mut self, ui: &mut egui::Ui) {
        if ui
            .selectable_label(self.adding_marker, "📍 Add marker")
            .on_hover_text("Click the plan to place a marker")
            .clicked()
        {
            self.adding_marker = !self.adding_marker;
        }
        ui.separator();
        if ui.button("Zoom in").clicked() {
            self.view.zoom_in();
        }
        if ui.button("Zoom out").clicked() {
            self.view.zoom_out();
        }
        if ui.button("Reset").clicked() {
            self.view.reset();
        }
        ui.separator();
        ui.label(format!("Zoom: {:.0}%", self.view.zoom() * 100.0));
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        plan: &FloorPlan,
        selected: Option<MarkerId>,
    ) -> Vec<ViewerEvent> {
        let mut events = Vec::new();
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

        // Wheel and pan are locked while placing a marker.
        if !self.adding_marker {
            self.handle_pan_zoom(ui, &response, canvas_rect);
        }

        let image_rect = self.view.image_rect(canvas_rect, self.image_size);
        match &self.texture {
            Some((id, tex)) if *id == plan.id => {
                painter.image(
                    tex.id(),
                    image_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            _ => {
                painter.rect_filled(image_rect, 0.0, egui::Color32::from_gray(90));
            }
        }

        if self.adding_marker && response.clicked_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                if image_rect.contains(pos) {
                    match pointer_to_percent((pos.x, pos.y), image_rect.into()) {
                        Some(at) => {
                            events.push(ViewerEvent::Add(at));
                            self.adding_marker = false;
                        }
                        None => log::debug!("ignoring click on an unmeasured plan"),
                    }
                }
            }
        }

        let viewport = ui.ctx().screen_rect();
        for marker in &plan.markers {
            if let Some(event) =
                self.show_marker(ui, &painter, marker, image_rect, viewport, selected)
            {
                events.push(event);
            }
        }

        if self.adding_marker {
            painter.text(
                canvas_rect.left_top() + egui::vec2(12.0, 12.0),
                egui::Align2::LEFT_TOP,
                "Click on the plan to place a marker",
                egui::FontId::proportional(16.0),
                egui::Color32::WHITE,
            );
        }

        events
    }

    fn handle_pan_zoom(&mut self, ui: &egui::Ui, response: &egui::Response, canvas_rect: egui::Rect) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.view.pan_by(response.drag_delta());
        }

        let scroll_delta = ui.ctx().input(|i| i.smooth_scroll_delta.y);
        if scroll_delta != 0.0 && response.hovered() {
            let factor = 1.0 + scroll_delta * 0.002;
            let anchor = response
                .hover_pos()
                .map(|cursor| cursor - canvas_rect.center())
                .unwrap_or(egui::Vec2::ZERO);
            self.view.zoom_by(factor, anchor);
        }
    }

    fn show_marker(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        marker: &Marker,
        image_rect: egui::Rect,
        viewport: egui::Rect,
        selected: Option<MarkerId>,
    ) -> Option<ViewerEvent> {
        let (x, y) = percent_to_pointer(
            Percent {
                x: marker.x,
                y: marker.y,
            },
            image_rect.into(),
        );
        let anchor = egui::pos2(x, y);
        let hit_rect = egui::Rect::from_center_size(anchor, egui::Vec2::splat(self.pin_size));
        let response = ui.interact(
            hit_rect,
            ui.id().with(("marker", marker.id)),
            egui::Sense::click_and_drag(),
        );

        let mut event = None;
        if response.clicked() {
            event = Some(ViewerEvent::Select(marker.id));
        }
        if response.drag_started() {
            self.drag = DragState::Moving {
                id: marker.id,
                offset: egui::Vec2::ZERO,
            };
        }

        let mut drawn_at = anchor;
        if let DragState::Moving { id, offset } = &mut self.drag {
            if *id == marker.id {
                if response.dragged() {
                    *offset += response.drag_delta();
                }
                drawn_at += *offset;
            }
        }

        if response.drag_stopped() {
            if let DragState::Moving { id, offset } =
                std::mem::replace(&mut self.drag, DragState::None)
            {
                if id == marker.id {
                    let reference = match self.drag_reference {
                        DragReference::Image => image_rect.size(),
                        DragReference::Viewport => viewport.size(),
                    };
                    match dropped_position(marker, offset, reference) {
                        Some(to) => event = Some(ViewerEvent::Move { id, to }),
                        None => log::debug!("dropped {id} on an unmeasured plan"),
                    }
                    drawn_at = anchor;
                }
            }
        }

        self.draw_pin(painter, drawn_at, selected == Some(marker.id));
        if let Some(description) = marker.description.as_deref().filter(|d| !d.is_empty()) {
            response.on_hover_text(description);
        }
        event
    }

    fn draw_pin(&self, painter: &egui::Painter, at: egui::Pos2, is_selected: bool) {
        let r = self.pin_size * 0.3;
        let head = at - egui::vec2(0.0, r * 0.6);
        painter.add(egui::Shape::convex_polygon(
            vec![
                head + egui::vec2(-r * 0.8, r * 0.5),
                head + egui::vec2(r * 0.8, r * 0.5),
                at + egui::vec2(0.0, r * 1.2),
            ],
            PIN_COLOR,
            egui::Stroke::NONE,
        ));
        painter.circle_filled(head, r, PIN_COLOR);
        painter.circle_filled(head, r * 0.4, egui::Color32::WHITE);
        if is_selected {
            painter.rect_stroke(
                egui::Rect::from_center_size(at, egui::Vec2::splat(self.pin_size)).expand(4.0),
                2.0,
                egui::Stroke::new(1.5, SELECTION_COLOR),
                egui::StrokeKind::Middle,
            );
        }
    }
}

/// Marker position after being dragged `offset` pixels, measured against a
/// reference size in pixels.
fn dropped_position(marker: &Marker, offset: egui::Vec2, reference: egui::Vec2) -> Option<Percent> {
    let delta = drag_delta_to_percent((offset.x, offset.y), (reference.x, reference.y))?;
    Some(Percent {
        x: marker.x + delta.x,
        y: marker.y + delta.y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::BoundingBox;

    fn canvas() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(1000.0, 800.0))
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = View::new(&Config::default());
        for _ in 0..20 {
            view.zoom_in();
        }
        assert_eq!(view.zoom(), 4.0);
        for _ in 0..40 {
            view.zoom_out();
        }
        assert_eq!(view.zoom(), 0.5);
        view.reset();
        assert_eq!(view.zoom(), 1.0);
    }

    #[test]
    fn test_small_plan_is_not_upscaled() {
        let view = View::new(&Config::default());
        let rect = view.image_rect(canvas(), egui::vec2(200.0, 100.0));
        assert_eq!(rect.size(), egui::vec2(200.0, 100.0));
        assert_eq!(rect.center(), canvas().center());
    }

    #[test]
    fn test_large_plan_fits_canvas() {
        let view = View::new(&Config::default());
        let rect = view.image_rect(canvas(), egui::vec2(4000.0, 1600.0));
        assert!((rect.width() - 1000.0).abs() < 1e-3);
        assert!((rect.height() - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_keeps_anchor_on_same_plan_point() {
        let mut view = View::new(&Config::default());
        view.pan_by(egui::vec2(35.0, -20.0));
        let size = egui::vec2(600.0, 400.0);
        let cursor = egui::pos2(420.0, 330.0);

        let before = pointer_to_percent((cursor.x, cursor.y), view.image_rect(canvas(), size).into())
            .unwrap();
        view.zoom_by(1.8, cursor - canvas().center());
        let after = pointer_to_percent((cursor.x, cursor.y), view.image_rect(canvas(), size).into())
            .unwrap();

        assert!((before.x - after.x).abs() < 1e-3);
        assert!((before.y - after.y).abs() < 1e-3);
    }

    #[test]
    fn test_marker_position_survives_zoom() {
        let mut view = View::new(&Config::default());
        let size = egui::vec2(600.0, 400.0);
        let at = Percent { x: 30.0, y: 70.0 };

        view.zoom_in();
        view.pan_by(egui::vec2(-80.0, 15.0));
        let bbox: BoundingBox = view.image_rect(canvas(), size).into();
        let (px, py) = percent_to_pointer(at, bbox);
        let back = pointer_to_percent((px, py), bbox).unwrap();
        assert!((back.x - 30.0).abs() < 1e-3);
        assert!((back.y - 70.0).abs() < 1e-3);
    }

    #[test]
    fn test_set_image_accepts_plan_wider_than_texture_limit() {
        let ctx = egui::Context::default();
        let max_side = ctx.input(|i| i.max_texture_side) as u32;
        let mut viewer = FloorPlanViewer::new(&Config::default());
        let plan = PlanId::new();

        viewer.set_image(&ctx, plan, &RgbaImage::new(max_side + 1, 10));

        let (id, texture) = viewer.texture.as_ref().unwrap();
        assert_eq!(*id, plan);
        assert!(texture.size()[0] <= max_side as usize);
        assert_eq!(viewer.image_size, egui::vec2((max_side + 1) as f32, 10.0));
    }

    #[test]
    fn test_dropped_position_adds_delta() {
        let marker = Marker::new(40.0, 40.0);
        let to = dropped_position(&marker, egui::vec2(50.0, -100.0), egui::vec2(500.0, 400.0))
            .unwrap();
        assert!((to.x - 50.0).abs() < 1e-4);
        assert!((to.y - 15.0).abs() < 1e-4);
        assert!(dropped_position(&marker, egui::vec2(1.0, 1.0), egui::Vec2::ZERO).is_none());
    }

    #[test]
    fn test_dropped_position_depends_on_reference() {
        // The same 100px drag moves a marker further on a small image than
        // when measured against a full window.
        let marker = Marker::new(10.0, 10.0);
        let on_image = dropped_position(&marker, egui::vec2(100.0, 0.0), egui::vec2(400.0, 300.0))
            .unwrap();
        let on_window =
            dropped_position(&marker, egui::vec2(100.0, 0.0), egui::vec2(1600.0, 900.0)).unwrap();
        assert!((on_image.x - 35.0).abs() < 1e-4);
        assert!((on_window.x - 16.25).abs() < 1e-4);
    }
}
