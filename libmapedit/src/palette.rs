//! Assignment of a small set of reusable colors to driver names
use serde::Serialize;
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, FromRepr};

/// The color classes given to drivers, in the order they are handed out
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, FromRepr, Serialize,
)]
pub enum DriverColor {
    #[strum(serialize = "driver-blue")]
    Blue,
    #[strum(serialize = "driver-pink")]
    Pink,
    #[strum(serialize = "driver-red")]
    Red,
    #[strum(serialize = "driver-green")]
    Green,
}

impl DriverColor {
    /// Swatch color used when drawing the legend
    pub fn swatch(&self) -> &'static str {
        match self {
            DriverColor::Blue => "#007bff",
            DriverColor::Pink => "#d543bd",
            DriverColor::Red => "#dc3545",
            DriverColor::Green => "#28a745",
        }
    }

    /// Number of distinct colors before they start being reused
    pub fn cycle_len() -> usize {
        Self::iter().count()
    }
}

/// Normalized form of a driver name: trimmed and lowercased. Returns `None` for names that are
/// empty after trimming.
pub fn normalize_driver(name: &str) -> Option<String> {
    let key = name.trim().to_lowercase();
    match key.is_empty() {
        true => None,
        false => Some(key),
    }
}

/// Hands out colors to driver names round-robin, in the order the names are first seen. Once a
/// name has a color it keeps it until the palette is reset.
#[derive(Debug, Default, Clone)]
pub struct DriverPalette {
    next: usize,
    assigned: HashMap<String, DriverColor>,
    order: Vec<String>,
}

impl DriverPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// The color for the given driver, assigning the next one in the cycle if the driver has not
    /// been seen since the last reset. Drivers without a name get no color.
    pub fn color_for(&mut self, driver: &str) -> Option<DriverColor> {
        let key = normalize_driver(driver)?;
        if let Some(color) = self.assigned.get(&key) {
            return Some(*color);
        }
        let color = DriverColor::from_repr(self.next % DriverColor::cycle_len())?;
        self.next += 1;
        self.assigned.insert(key.clone(), color);
        self.order.push(key);
        Some(color)
    }

    /// Look up a driver's color without assigning one
    pub fn get(&self, driver: &str) -> Option<DriverColor> {
        normalize_driver(driver).and_then(|key| self.assigned.get(&key).copied())
    }

    /// All assigned (driver, color) pairs, in the order they were assigned
    pub fn legend(&self) -> impl Iterator<Item = (&str, DriverColor)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.assigned[name]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn reset(&mut self) {
        self.next = 0;
        self.assigned.clear();
        self.order.clear();
    }
}
