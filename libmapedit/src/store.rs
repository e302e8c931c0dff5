//! The set of location records, their markers, and the edit operations on them
//!
//! [LocationStore] owns the records and keeps exactly one marker per record on its
//! [MarkerLayer]. [Editor] wraps a store with the mode toggle, the coordinate picked on the map,
//! and a [WriteSink] that local edits are reported to.
use crate::{
    error::{Error, Result},
    feed::FeedSnapshot,
    location::{Location, LocationId},
    marker::{Marker, MarkerLayer},
    mode::{Mode, ModeController},
    palette::{DriverColor, DriverPalette},
    sink::WriteSink,
    source::FeedSource,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageType {
    Info,
    Success,
    Error,
}

/// A message for the operator describing the outcome of the last action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub kind: MessageType,
    pub text: String,
}

impl StatusMessage {
    fn new(kind: MessageType, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn info(text: impl Into<String>) -> Self {
        Self::new(MessageType::Info, text)
    }

    fn success(text: impl Into<String>) -> Self {
        Self::new(MessageType::Success, text)
    }
}

impl From<&Error> for StatusMessage {
    fn from(e: &Error) -> Self {
        match e.is_user_visible() {
            true => Self::new(MessageType::Error, e.to_string()),
            false => Self::new(MessageType::Error, "Error submitting. See console."),
        }
    }
}

/// What a full reload did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    pub locations: usize,
    pub dropped: usize,
    pub drivers: usize,
}

#[derive(Debug)]
pub struct LocationStore<L: MarkerLayer> {
    locations: BTreeMap<LocationId, Location>,
    markers: BTreeMap<LocationId, Marker>,
    palette: DriverPalette,
    next_id: LocationId,
    layer: L,
}

impl<L: MarkerLayer> LocationStore<L> {
    pub fn new(layer: L) -> Self {
        Self {
            locations: Default::default(),
            markers: Default::default(),
            palette: Default::default(),
            next_id: 1,
            layer,
        }
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn marker(&self, id: LocationId) -> Option<&Marker> {
        self.markers.get(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn next_id(&self) -> LocationId {
        self.next_id
    }

    pub fn palette(&self) -> &DriverPalette {
        &self.palette
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    /// Remove every record and marker and forget all driver colors
    pub fn reset(&mut self) {
        for id in self.markers.keys() {
            self.layer.remove(*id);
        }
        self.markers.clear();
        self.locations.clear();
        self.palette.reset();
        self.next_id = 1;
    }

    /// Replace the whole store with the contents of a feed. Driver colors are assigned in feed
    /// order before any marker is drawn.
    pub fn apply(&mut self, snapshot: FeedSnapshot) -> ReloadSummary {
        self.reset();
        for driver in &snapshot.drivers {
            self.palette.color_for(driver);
        }
        let dropped = snapshot.data_rows.saturating_sub(snapshot.drivers.len());
        for location in snapshot.locations.into_values() {
            self.insert(location);
        }
        self.next_id = self.next_id.max(snapshot.next_id);
        ReloadSummary {
            locations: self.locations.len(),
            dropped,
            drivers: self.palette.len(),
        }
    }

    /// Add or replace a record, redrawing its marker. The next id moves past the record's id so
    /// that a later create cannot reuse it.
    pub fn insert(&mut self, location: Location) {
        let id = location.id;
        self.next_id = match id.checked_add(1) {
            Some(after) => self.next_id.max(after),
            None => LocationId::MAX,
        };
        if self.markers.remove(&id).is_some() {
            self.layer.remove(id);
        }
        let color = self.palette.color_for(&location.driver);
        let marker = Marker::new(&location, color);
        trace!(id, class = %marker.class_name(), "drawing marker");
        self.layer.add(&marker);
        self.markers.insert(id, marker);
        self.locations.insert(id, location);
    }

    /// Remove a record and its marker, returning the record if it existed
    pub fn remove(&mut self, id: LocationId) -> Option<Location> {
        if self.markers.remove(&id).is_some() {
            self.layer.remove(id);
        }
        self.locations.remove(&id)
    }

    /// Hand out the id for a new record, unless every id is taken
    fn take_next_id(&mut self) -> Option<LocationId> {
        let id = self.next_id;
        if id == LocationId::MAX || self.locations.contains_key(&id) {
            return None;
        }
        self.next_id = id + 1;
        Some(id)
    }
}

/// The editable fields of a location
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LocationForm {
    pub name: String,
    pub hub: String,
    pub address: String,
    pub viability: String,
    pub notes: String,
    pub expecting: String,
    pub driver: String,
}

impl LocationForm {
    fn prefill(loc: &Location) -> Self {
        let or_no = |s: &str| match s.is_empty() {
            true => "No".to_string(),
            false => s.to_string(),
        };
        Self {
            name: loc.name.clone(),
            hub: or_no(&loc.hub),
            address: loc.address.clone(),
            viability: loc.viability.clone(),
            notes: loc.notes.clone(),
            expecting: or_no(&loc.expecting),
            driver: loc.driver.clone(),
        }
    }

    fn into_location(self, id: LocationId, (lat, lng): (f64, f64)) -> Location {
        Location {
            id,
            name: self.name.trim().to_string(),
            hub: self.hub,
            address: self.address.trim().to_string(),
            lat,
            lng,
            viability: self.viability.trim().to_string(),
            notes: self.notes.trim().to_string(),
            expecting: self.expecting,
            driver: self.driver.trim().to_string(),
        }
    }
}

/// The editing session: the store plus mode, map selection, and the outbound write channel
#[derive(Debug)]
pub struct Editor<L: MarkerLayer, S: WriteSink> {
    store: LocationStore<L>,
    mode: ModeController,
    selected: Option<(f64, f64)>,
    sink: S,
    status: Option<StatusMessage>,
}

impl<L: MarkerLayer, S: WriteSink> Editor<L, S> {
    pub fn new(layer: L, sink: S) -> Self {
        Self {
            store: LocationStore::new(layer),
            mode: ModeController::new(),
            selected: None,
            sink,
            status: None,
        }
    }

    pub fn store(&self) -> &LocationStore<L> {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn edit_target(&self) -> Option<LocationId> {
        self.mode.edit_target()
    }

    pub fn selected_coordinate(&self) -> Option<(f64, f64)> {
        self.selected
    }

    /// The status message left by the last action, if any
    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn driver_legend(&self) -> impl Iterator<Item = (&str, DriverColor)> {
        self.store.palette().legend()
    }

    fn report<T>(&mut self, res: Result<(T, StatusMessage)>) -> Result<T> {
        match res {
            Ok((val, msg)) => {
                self.status = Some(msg);
                Ok(val)
            }
            Err(e) => {
                if e.is_user_visible() {
                    debug!(%e, "rejected action");
                } else {
                    warn!(?e, "action failed");
                }
                self.status = Some((&e).into());
                Err(e)
            }
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode.set_mode(mode);
        self.status = Some(StatusMessage::info(format!("Mode: {mode}")));
    }

    /// Whether a background reload that fires now should go ahead
    pub fn reload_permitted(&self) -> bool {
        let permitted = self.mode.allows_background_reload();
        if !permitted {
            debug!(
                mode = %self.mode.mode(),
                target = ?self.mode.edit_target(),
                "background reload suppressed"
            );
        }
        permitted
    }

    /// Replace all records with the contents of the given feed text. A feed without data rows is
    /// ignored and leaves the current state alone.
    pub fn apply_feed(&mut self, text: &str) -> Result<ReloadSummary> {
        let snapshot = FeedSnapshot::parse(text);
        if snapshot.data_rows == 0 {
            warn!("feed has no data rows, keeping current locations");
            return Err(Error::FeedEmpty);
        }
        let summary = self.store.apply(snapshot);
        info!(
            locations = summary.locations,
            dropped = summary.dropped,
            drivers = summary.drivers,
            next_id = self.store.next_id(),
            "reloaded locations"
        );
        Ok(summary)
    }

    /// Fetch the feed and apply it. If the fetch fails nothing changes.
    pub async fn reload_from(&mut self, source: &dyn FeedSource) -> Result<ReloadSummary> {
        let text = source.fetch().await.inspect_err(|e| {
            warn!(?e, "Error loading feed");
        })?;
        self.apply_feed(&text)
    }

    /// Pick the coordinate for a new record. This also drops any edit target, so the next submit
    /// creates a record.
    pub fn select_coordinate(&mut self, lat: f64, lng: f64) -> Result<()> {
        let res = self.do_select_coordinate(lat, lng);
        self.report(res)
    }

    fn do_select_coordinate(&mut self, lat: f64, lng: f64) -> Result<((), StatusMessage)> {
        self.mode.require_edit(Error::ViewModeSelect)?;
        if !lat.is_finite() || !lng.is_finite() {
            return Err(Error::InvalidCoordinate(format!("{lat}, {lng}")));
        }
        self.selected = Some((lat, lng));
        self.mode.clear_edit_target();
        Ok((
            (),
            StatusMessage::info("Location selected on map for a NEW record."),
        ))
    }

    /// Load an existing record into the form so that the next submit updates it
    pub fn begin_edit(&mut self, id: LocationId) -> Result<LocationForm> {
        let res = self.do_begin_edit(id);
        self.report(res)
    }

    fn do_begin_edit(&mut self, id: LocationId) -> Result<(LocationForm, StatusMessage)> {
        let loc = self.store.get(id).ok_or(Error::UnknownLocation(id))?;
        self.mode.require_edit(Error::ViewModeEdit)?;
        let form = LocationForm::prefill(loc);
        self.selected = Some((loc.lat, loc.lng));
        self.mode.set_edit_target(id);
        Ok((
            form,
            StatusMessage::info(format!(
                "Editing existing ID {id}. Submitting will UPDATE this row."
            )),
        ))
    }

    /// Submit the form: update the edit target if there is one, otherwise create a new record
    pub fn submit(&mut self, form: LocationForm) -> Result<LocationId> {
        match self.mode.edit_target() {
            Some(_) => self.update(form),
            None => self.create(form),
        }
    }

    fn validate(&self, form: &LocationForm) -> Result<(f64, f64)> {
        self.mode.require_edit(Error::ViewModeSubmit)?;
        let coords = self.selected.ok_or(Error::NoCoordinateSelected)?;
        if form.name.trim().is_empty() {
            return Err(Error::MissingName);
        }
        Ok(coords)
    }

    /// Create a new record at the selected coordinate with the next free id
    pub fn create(&mut self, form: LocationForm) -> Result<LocationId> {
        let res = self.do_create(form);
        self.report(res)
    }

    fn do_create(&mut self, form: LocationForm) -> Result<(LocationId, StatusMessage)> {
        let coords = self.validate(&form)?;
        let id = self.store.take_next_id().ok_or(Error::IdsExhausted)?;
        let location = form.into_location(id, coords);
        debug!(id, name = %location.name, "creating location");
        self.sink.notify_create(&location);
        self.store.insert(location);
        self.mode.clear_edit_target();
        Ok((
            id,
            StatusMessage::success(format!("Added ID {id}. (Sheet should reflect this.)")),
        ))
    }

    /// Replace the record currently selected for editing
    pub fn update(&mut self, form: LocationForm) -> Result<LocationId> {
        let res = self.do_update(form);
        self.report(res)
    }

    fn do_update(&mut self, form: LocationForm) -> Result<(LocationId, StatusMessage)> {
        let coords = self.validate(&form)?;
        let id = self.mode.edit_target().ok_or(Error::NoEditTarget)?;
        if self.store.get(id).is_none() {
            self.mode.clear_edit_target();
            return Err(Error::UnknownLocation(id));
        }
        let location = form.into_location(id, coords);
        debug!(id, name = %location.name, "updating location");
        self.sink.notify_update(&location);
        self.store.insert(location);
        self.mode.clear_edit_target();
        Ok((
            id,
            StatusMessage::success(format!("Updated ID {id}. (Sheet should reflect this.)")),
        ))
    }

    /// Remove a record and its marker right away; the remote delete is not waited on
    pub fn delete(&mut self, id: LocationId) -> Result<Location> {
        let res = self.do_delete(id);
        self.report(res)
    }

    fn do_delete(&mut self, id: LocationId) -> Result<(Location, StatusMessage)> {
        if self.store.get(id).is_none() {
            return Err(Error::UnknownLocation(id));
        }
        self.mode.require_edit(Error::ViewModeDelete)?;
        let location = self
            .store
            .remove(id)
            .ok_or(Error::UnknownLocation(id))?;
        if self.mode.edit_target() == Some(id) {
            self.mode.clear_edit_target();
        }
        debug!(id, "deleting location");
        self.sink.notify_delete(id);
        Ok((
            location,
            StatusMessage::info(format!("Deleted ID {id} from sheet (and map).")),
        ))
    }
}
