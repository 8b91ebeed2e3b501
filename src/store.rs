use chrono::{DateTime, Utc};
use std::fmt;

use crate::config::SelectionOnDelete;
use crate::model::{FloorPlan, ImageRef, Marker, MarkerDetails, MarkerId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    NoActivePlan,
    NotFound(MarkerId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoActivePlan => write!(f, "no floor plan is loaded"),
            StoreError::NotFound(id) => write!(f, "marker {id} not found"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Owns the active floor plan and the selection. Its methods are the only
/// way either of them changes; a failed call leaves both untouched.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    plan: Option<FloorPlan>,
    selected: Option<MarkerId>,
    selection_on_delete: SelectionOnDelete,
}

impl AnnotationStore {
    pub fn new(selection_on_delete: SelectionOnDelete) -> Self {
        Self {
            plan: None,
            selected: None,
            selection_on_delete,
        }
    }

    pub fn floor_plan(&self) -> Option<&FloorPlan> {
        self.plan.as_ref()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.plan.as_ref()?.marker(id)
    }

    pub fn selected_id(&self) -> Option<MarkerId> {
        self.selected
    }

    /// The selected marker, if the selection still names one in the plan.
    pub fn selected(&self) -> Option<&Marker> {
        self.marker(self.selected?)
    }

    /// Replaces whatever plan was active, markers included.
    pub fn load_floor_plan(&mut self, image: ImageRef, name: impl Into<String>) -> &FloorPlan {
        if let Some(old) = self.plan.take() {
            log::debug!("discarding {} with {} markers", old.id, old.markers.len());
        }
        self.selected = None;
        let plan = self.plan.insert(FloorPlan::new(image, name));
        log::info!("loaded floor plan {} ({})", plan.name, plan.id);
        plan
    }

    pub fn add_marker(&mut self, x: f32, y: f32) -> Result<Marker, StoreError> {
        let plan = self.plan.as_mut().ok_or(StoreError::NoActivePlan)?;
        let marker = Marker::new(x, y);
        plan.markers.push(marker.clone());
        self.selected = Some(marker.id);
        log::debug!("added {} at ({x:.2}%, {y:.2}%)", marker.id);
        Ok(marker)
    }

    pub fn move_marker(&mut self, id: MarkerId, x: f32, y: f32) -> Result<(), StoreError> {
        let slot = self.marker_mut(id)?;
        *slot = slot.with_position(x, y);
        log::debug!("moved {id} to ({x:.2}%, {y:.2}%)");
        Ok(())
    }

    pub fn update_marker_details(
        &mut self,
        id: MarkerId,
        details: MarkerDetails,
    ) -> Result<Marker, StoreError> {
        self.update_marker_details_at(id, details, Utc::now())
    }

    fn update_marker_details_at(
        &mut self,
        id: MarkerId,
        details: MarkerDetails,
        at: DateTime<Utc>,
    ) -> Result<Marker, StoreError> {
        let slot = self.marker_mut(id)?;
        *slot = slot.with_details(details, at);
        log::debug!("updated details of {id}");
        Ok(slot.clone())
    }

    pub fn delete_marker(&mut self, id: MarkerId) -> Result<Marker, StoreError> {
        let plan = self.plan.as_mut().ok_or(StoreError::NoActivePlan)?;
        let index = plan
            .markers
            .iter()
            .position(|m| m.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = plan.markers.remove(index);

        let clear = match self.selection_on_delete {
            SelectionOnDelete::Always => true,
            SelectionOnDelete::IfSelected => self.selected == Some(id),
        };
        if clear {
            self.selected = None;
        }
        log::debug!("deleted {id}");
        Ok(removed)
    }

    /// Not checked against the marker list.
    pub fn select_marker(&mut self, id: Option<MarkerId>) {
        self.selected = id;
    }

    fn marker_mut(&mut self, id: MarkerId) -> Result<&mut Marker, StoreError> {
        let plan = self.plan.as_mut().ok_or(StoreError::NoActivePlan)?;
        plan.markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}
