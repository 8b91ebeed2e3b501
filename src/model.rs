use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

// ── Identifiers ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId(Uuid);

impl MarkerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker-{}", self.0.simple())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanId(Uuid);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan-{}", self.0.simple())
    }
}

// ── Image reference ─────────────────────────────────────────────────────────

/// File types the intake accepts for a floor plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Jpeg,
    Png,
    Gif,
    Pdf,
}

#[derive(Clone, Debug)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Where the floor plan's pixels come from. The store never looks inside it.
#[derive(Clone, Debug)]
pub struct ImageRef {
    pub source: ImageSource,
    pub kind: FileKind,
}

// ── Markers ─────────────────────────────────────────────────────────────────

/// Free-text fields of a marker, submitted as a whole by the details form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerDetails {
    pub description: Option<String>,
    pub attachment: Option<String>,
}

/// A pin on the floor plan. `x` and `y` are percentages of the image's
/// width and height, so they survive any change of display scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub x: f32,
    pub y: f32,
    pub description: Option<String>,
    /// Photo reference: a URL or a `file://` URI.
    pub attachment: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Marker {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            id: MarkerId::new(),
            x,
            y,
            description: None,
            attachment: None,
            last_modified: None,
        }
    }

    /// Same marker at a new position. Nothing else changes, including the
    /// modification stamp.
    pub fn with_position(&self, x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }

    pub fn with_details(&self, details: MarkerDetails, at: DateTime<Utc>) -> Self {
        Self {
            description: details.description,
            attachment: details.attachment,
            last_modified: Some(at),
            ..self.clone()
        }
    }

    pub fn details(&self) -> MarkerDetails {
        MarkerDetails {
            description: self.description.clone(),
            attachment: self.attachment.clone(),
        }
    }
}

// ── Floor plan ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct FloorPlan {
    pub id: PlanId,
    pub image: ImageRef,
    pub name: String,
    /// Creation order, which is also the paint order.
    pub markers: Vec<Marker>,
}

impl FloorPlan {
    pub fn new(image: ImageRef, name: impl Into<String>) -> Self {
        Self {
            id: PlanId::new(),
            image,
            name: name.into(),
            markers: Vec::new(),
        }
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }
}
