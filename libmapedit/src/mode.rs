//! The View/Edit mode toggle that gates every mutating action
use crate::error::{Error, Result};
use crate::location::LocationId;
use serde::Serialize;
use strum_macros::{Display, EnumString};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    #[default]
    View,
    Edit,
}

/// Current mode plus the record currently loaded into the edit form, if any
#[derive(Debug, Default, Clone)]
pub struct ModeController {
    mode: Mode,
    edit_target: Option<LocationId>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch modes. Going back to View keeps any edit target so that an unsent edit is not lost.
    pub fn set_mode(&mut self, mode: Mode) {
        debug!(from = %self.mode, to = %mode, "switching mode");
        self.mode = mode;
    }

    pub fn is_editing(&self) -> bool {
        self.mode == Mode::Edit
    }

    /// Fails with the given error unless edit mode is active
    pub fn require_edit(&self, err: Error) -> Result<()> {
        match self.mode {
            Mode::Edit => Ok(()),
            Mode::View => Err(err),
        }
    }

    pub fn edit_target(&self) -> Option<LocationId> {
        self.edit_target
    }

    pub fn set_edit_target(&mut self, id: LocationId) {
        self.edit_target = Some(id);
    }

    pub fn clear_edit_target(&mut self) -> Option<LocationId> {
        self.edit_target.take()
    }

    /// Background reloads would throw away in-progress edits, so they only happen in view mode
    /// with nothing selected for editing
    pub fn allows_background_reload(&self) -> bool {
        self.mode == Mode::View && self.edit_target.is_none()
    }
}
