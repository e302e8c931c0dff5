//! This is a library that keeps a map of locations in sync with a spreadsheet-backed store. It
//! parses the published feed of the spreadsheet, keeps the set of location records and their map
//! markers consistent across reloads and local edits, and sends those edits back to the remote
//! store on a best-effort basis.

pub mod error;
pub mod feed;
pub mod location;
pub mod marker;
pub mod mode;
pub mod palette;
pub mod schedule;
pub mod sink;
pub mod source;
pub mod store;

pub use error::Error;
pub use error::Result;
pub use location::{Location, LocationId};
pub use store::Editor;
