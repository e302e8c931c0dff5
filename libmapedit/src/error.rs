//! Objects related to reporting errors from this library

use crate::location::LocationId;

/// A list of error types that can occur within this library
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // validation errors, shown to the operator as a status message
    #[error("Switch to Edit Mode to add/edit locations.")]
    ViewModeSubmit,

    #[error("Switch to Edit Mode to edit markers.")]
    ViewModeEdit,

    #[error("Switch to Edit Mode to delete markers.")]
    ViewModeDelete,

    #[error("Switch to Edit Mode to select a location on the map.")]
    ViewModeSelect,

    #[error("Click on the map first to choose Lat/Lng.")]
    NoCoordinateSelected,

    #[error("Location name is required.")]
    MissingName,

    #[error("No location is selected for editing.")]
    NoEditTarget,

    #[error("Location {0} does not exist.")]
    UnknownLocation(LocationId),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("No location ids are left to assign.")]
    IdsExhausted,

    // transport errors, logged only
    #[error("Feed request failed with status {0}")]
    FeedStatus(reqwest::StatusCode),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    // feed errors
    #[error("The feed contains no data rows")]
    FeedEmpty,
}

impl Error {
    /// Whether this error should be reported to the operator. Transport and feed errors are only
    /// logged.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            Error::FeedStatus(_) | Error::Transport(_) | Error::Io(_) | Error::FeedEmpty
        )
    }
}

/// A convenience type alias for a [Result] with [Error] as its error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
