use libmapedit::{
    Location,
    location::Status,
    marker::Marker,
    palette::DriverColor,
};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct LocationRow {
    id: u64,
    name: String,
    hub: String,
    address: String,
    lat: f64,
    lng: f64,
    viability: String,
    notes: String,
    expecting: String,
    driver: String,
    status: String,
    color: String,
}

impl LocationRow {
    pub(crate) fn new(location: &Location, marker: &Marker) -> Self {
        Self {
            id: location.id,
            name: location.name.clone(),
            hub: location.hub.clone(),
            address: location.address.clone(),
            lat: location.lat,
            lng: location.lng,
            viability: location.viability.clone(),
            notes: location.notes.clone(),
            expecting: location.expecting.clone(),
            driver: location.driver.clone(),
            status: marker.status.to_string(),
            color: marker
                .driver_color
                .map(|c| c.to_string())
                .unwrap_or_default(),
        }
    }
}

/// One entry of the status or driver legend
#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct LegendRow {
    label: String,
    class: String,
    swatch: String,
}

impl LegendRow {
    pub(crate) fn status(status: Status) -> Self {
        let (label, swatch) = status.legend();
        Self {
            label: label.to_string(),
            class: status.to_string(),
            swatch: swatch.to_string(),
        }
    }

    pub(crate) fn driver(name: &str, color: DriverColor) -> Self {
        Self {
            label: name.to_string(),
            class: color.to_string(),
            swatch: color.swatch().to_string(),
        }
    }
}
