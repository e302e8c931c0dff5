//! Visual markers for locations and the layer that displays them
use crate::location::{Location, LocationId, Status};
use crate::palette::DriverColor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::trace;

const MARKER_CLASS: &str = "ua3-marker";

/// Everything a map needs to draw a single location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: LocationId,
    pub lat: f64,
    pub lng: f64,
    pub status: Status,
    /// Accent drawn on top of the status, independent of it
    pub driver_color: Option<DriverColor>,
    pub popup: String,
}

impl Marker {
    pub fn new(location: &Location, driver_color: Option<DriverColor>) -> Self {
        Self {
            id: location.id,
            lat: location.lat,
            lng: location.lng,
            status: location.status(),
            driver_color,
            popup: popup_text(location),
        }
    }

    /// The css-like class list used to style the marker icon
    pub fn class_name(&self) -> String {
        match self.driver_color {
            Some(color) => format!("{MARKER_CLASS} {} {color}", self.status),
            None => format!("{MARKER_CLASS} {}", self.status),
        }
    }
}

/// The text shown when a marker is opened
pub fn popup_text(location: &Location) -> String {
    let name = match location.name.is_empty() {
        true => "Unnamed location",
        false => location.name.as_str(),
    };
    let mut text = format!("ID {} — {name}\n", location.id);
    if !location.address.is_empty() {
        _ = writeln!(text, "{}", location.address);
    }
    if !location.viability.is_empty() {
        _ = writeln!(text, "Viability: {} / 10", location.viability);
    }
    if !location.notes.is_empty() {
        _ = writeln!(text, "Notes: {}", location.notes);
    }
    _ = writeln!(text, "Hub: {}", location.hub);
    _ = writeln!(text, "Expecting Load: {}", location.expecting);
    _ = write!(text, "Driver: {}", location.driver().unwrap_or("Unassigned"));
    text
}

/// The surface markers are drawn on. Implementations only display what they are given; keeping
/// the markers consistent with the location records is up to the caller.
pub trait MarkerLayer {
    fn add(&mut self, marker: &Marker);
    fn remove(&mut self, id: LocationId);
}

/// A marker layer that just keeps its markers in memory
#[derive(Debug, Default)]
pub struct MemoryLayer {
    markers: BTreeMap<LocationId, Marker>,
}

impl MemoryLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: LocationId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.markers.keys().copied()
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl MarkerLayer for MemoryLayer {
    fn add(&mut self, marker: &Marker) {
        trace!(marker.id, "adding marker to layer");
        self.markers.insert(marker.id, marker.clone());
    }

    fn remove(&mut self, id: LocationId) {
        trace!(id, "removing marker from layer");
        self.markers.remove(&id);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    fn depot() -> Location {
        Location {
            id: 5,
            name: "Depot".into(),
            hub: "Yes".into(),
            address: "1 Main St".into(),
            lat: 40.0,
            lng: -74.0,
            viability: "8".into(),
            notes: "ok".into(),
            expecting: "No".into(),
            driver: "".into(),
        }
    }

    #[test]
    fn test_class_name() {
        let marker = Marker::new(&depot(), None);
        assert_eq!(marker.class_name(), "ua3-marker hub");

        let mut loc = depot();
        loc.hub = "No".into();
        loc.expecting = "y".into();
        let marker = Marker::new(&loc, Some(DriverColor::Red));
        assert_eq!(marker.status, Status::Expecting);
        assert_eq!(marker.class_name(), "ua3-marker expecting driver-red");

        loc.expecting = "".into();
        let marker = Marker::new(&loc, Some(DriverColor::Blue));
        assert_eq!(marker.class_name(), "ua3-marker not-expecting driver-blue");
    }

    #[test]
    fn test_popup() {
        assert_eq!(
            popup_text(&depot()),
            "ID 5 — Depot\n1 Main St\nViability: 8 / 10\nNotes: ok\nHub: Yes\nExpecting Load: No\nDriver: Unassigned"
        );
        let loc = Location::new(2, "".into(), 1.0, 2.0);
        assert_eq!(
            popup_text(&loc),
            "ID 2 — Unnamed location\nHub: \nExpecting Load: \nDriver: Unassigned"
        );
    }

    #[test]
    fn test_memory_layer() {
        let mut layer = MemoryLayer::new();
        layer.add(&Marker::new(&depot(), None));
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.get(5).map(|m| m.lat), Some(40.0));
        layer.remove(5);
        layer.remove(5);
        assert!(layer.is_empty());
    }
}
