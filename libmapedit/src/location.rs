//! The canonical location record
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

pub type LocationId = u64;

/// A single row of the backing spreadsheet. Text fields are kept as they appear in the sheet;
/// helper methods interpret the flag-like ones.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub hub: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub viability: String,
    pub notes: String,
    pub expecting: String,
    pub driver: String,
}

/// The primary visual classification of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Status {
    Hub,
    Expecting,
    NotExpecting,
}

impl Status {
    /// Label and swatch color used in the status legend
    pub fn legend(&self) -> (&'static str, &'static str) {
        match self {
            Status::Hub => ("Hub", "orange"),
            Status::Expecting => ("Expecting load", "green"),
            Status::NotExpecting => ("Not expecting load", "gray"),
        }
    }
}

/// Interpret a free-text flag as a boolean
pub fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "1"
    )
}

impl Location {
    pub fn new(id: LocationId, name: String, lat: f64, lng: f64) -> Self {
        Self {
            id,
            name,
            lat,
            lng,
            ..Default::default()
        }
    }

    pub fn is_hub(&self) -> bool {
        self.hub.trim().eq_ignore_ascii_case("yes")
    }

    pub fn is_expecting(&self) -> bool {
        truthy(&self.expecting)
    }

    /// The owning driver, if any. Whitespace-only names count as no driver.
    pub fn driver(&self) -> Option<&str> {
        let driver = self.driver.trim();
        match driver.is_empty() {
            true => None,
            false => Some(driver),
        }
    }

    /// Hub takes priority over the expecting flag
    pub fn status(&self) -> Status {
        if self.is_hub() {
            Status::Hub
        } else if self.is_expecting() {
            Status::Expecting
        } else {
            Status::NotExpecting
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn test_flags() {
        let mut loc = Location::new(1, "Depot".into(), 40.0, -74.0);
        assert_eq!(loc.status(), Status::NotExpecting);
        for val in ["yes", "Y", " TRUE ", "1"] {
            loc.expecting = val.into();
            assert!(loc.is_expecting(), "{val:?} should be truthy");
        }
        loc.expecting = "no".into();
        assert!(!loc.is_expecting());
        loc.expecting = "yes".into();
        assert_eq!(loc.status(), Status::Expecting);

        // hub wins over expecting
        loc.hub = "Yes".into();
        assert_eq!(loc.status(), Status::Hub);
        loc.hub = "y".into();
        assert_eq!(loc.status(), Status::Expecting);
    }

    #[test]
    fn test_driver() {
        let mut loc = Location::new(1, "Depot".into(), 40.0, -74.0);
        assert_eq!(loc.driver(), None);
        loc.driver = "   ".into();
        assert_eq!(loc.driver(), None);
        loc.driver = " Alice ".into();
        assert_eq!(loc.driver(), Some("Alice"));
    }

    #[test]
    fn test_status_class() {
        assert_eq!(Status::NotExpecting.to_string(), "not-expecting");
        assert_eq!(Status::Hub.to_string(), "hub");
    }
}
