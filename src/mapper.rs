//! Conversions between screen pixels and plan-relative percentages.
//!
//! The bounding box passed in must be the image's own on-screen rectangle.
//! Pan and zoom move and scale that rectangle together with the pointer, so
//! the percentages that come out do not depend on the current view.

use serde::{Deserialize, Serialize};

/// Position as a percentage of the image's width (`x`) and height (`y`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Percent {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// False for an image that has not been laid out yet.
    pub fn is_measurable(&self) -> bool {
        is_extent(self.width) && is_extent(self.height)
    }
}

impl From<egui::Rect> for BoundingBox {
    fn from(rect: egui::Rect) -> Self {
        Self::new(rect.min.x, rect.min.y, rect.width(), rect.height())
    }
}

fn is_extent(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Which size a dragged pixel distance is measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragReference {
    /// The image as currently rendered. Exact at any zoom level.
    #[default]
    Image,
    /// The whole window. Only matches the image when it fills the window.
    Viewport,
}

pub fn pointer_to_percent(pointer: (f32, f32), bbox: BoundingBox) -> Option<Percent> {
    if !bbox.is_measurable() {
        return None;
    }
    Some(Percent {
        x: (pointer.0 - bbox.left) / bbox.width * 100.0,
        y: (pointer.1 - bbox.top) / bbox.height * 100.0,
    })
}

pub fn percent_to_pointer(percent: Percent, bbox: BoundingBox) -> (f32, f32) {
    (
        bbox.left + percent.x / 100.0 * bbox.width,
        bbox.top + percent.y / 100.0 * bbox.height,
    )
}

/// Converts a drag displacement in pixels into a percentage displacement to be
/// added to the dragged marker's stored position.
pub fn drag_delta_to_percent(delta: (f32, f32), reference: (f32, f32)) -> Option<Percent> {
    if !is_extent(reference.0) || !is_extent(reference.1) {
        return None;
    }
    Some(Percent {
        x: delta.0 / reference.0 * 100.0,
        y: delta.1 / reference.1 * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Percent, x: f32, y: f32) -> bool {
        (a.x - x).abs() < 1e-4 && (a.y - y).abs() < 1e-4
    }

    #[test]
    fn test_pointer_inside_box() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 100.0);
        let p = pointer_to_percent((150.0, 75.0), bbox).unwrap();
        assert!(close(p, 25.0, 25.0), "{p:?}");
    }

    #[test]
    fn test_pointer_at_corners() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 100.0);
        let top_left = pointer_to_percent((100.0, 50.0), bbox).unwrap();
        let bottom_right = pointer_to_percent((300.0, 150.0), bbox).unwrap();
        assert!(close(top_left, 0.0, 0.0));
        assert!(close(bottom_right, 100.0, 100.0));
    }

    #[test]
    fn test_pointer_outside_box_is_not_clamped() {
        let bbox = BoundingBox::new(0.0, 0.0, 200.0, 100.0);
        let p = pointer_to_percent((-20.0, 150.0), bbox).unwrap();
        assert!(close(p, -10.0, 150.0));
    }

    #[test]
    fn test_unmeasured_box_is_rejected() {
        assert!(pointer_to_percent((1.0, 1.0), BoundingBox::new(0.0, 0.0, 0.0, 10.0)).is_none());
        assert!(pointer_to_percent((1.0, 1.0), BoundingBox::new(0.0, 0.0, 10.0, -1.0)).is_none());
        assert!(pointer_to_percent((1.0, 1.0), BoundingBox::new(0.0, 0.0, f32::NAN, 10.0)).is_none());
    }

    #[test]
    fn test_mapping_ignores_zoom_and_pan() {
        // Same spot on a 400x300 image, drawn at 1x and then at 2.5x shifted.
        let base = BoundingBox::new(10.0, 20.0, 400.0, 300.0);
        let zoomed = BoundingBox::new(-130.0, 75.0, 1000.0, 750.0);
        let at_base = pointer_to_percent((110.0, 95.0), base).unwrap();
        let at_zoom = pointer_to_percent((-130.0 + 250.0, 75.0 + 187.5), zoomed).unwrap();
        assert!(close(at_base, 25.0, 25.0));
        assert!(close(at_zoom, at_base.x, at_base.y));
    }

    #[test]
    fn test_percent_to_pointer_inverts_mapping() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 100.0);
        let (px, py) = percent_to_pointer(Percent { x: 25.0, y: 25.0 }, bbox);
        assert!((px - 150.0).abs() < 1e-4);
        assert!((py - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_drag_delta() {
        let d = drag_delta_to_percent((50.0, -25.0), (200.0, 100.0)).unwrap();
        assert!(close(d, 25.0, -25.0));
        assert!(drag_delta_to_percent((1.0, 1.0), (0.0, 100.0)).is_none());
    }

    #[test]
    fn test_drag_reference_serde_names() {
        let json = serde_json::to_string(&DragReference::Viewport).unwrap();
        assert_eq!(json, "\"viewport\"");
        let parsed: DragReference = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(parsed, DragReference::Image);
    }

    #[test]
    fn test_from_egui_rect() {
        let rect = egui::Rect::from_min_size(egui::pos2(5.0, 6.0), egui::vec2(70.0, 80.0));
        assert_eq!(BoundingBox::from(rect), BoundingBox::new(5.0, 6.0, 70.0, 80.0));
    }
}
