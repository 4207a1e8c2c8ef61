//! Tutorial Session
//!
//! The composed session a host drives: catalog, progress, statistics and
//! validation behind one step-advance loop.

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod session;

pub use catalog::{TutorialCatalog, TutorialContent};
pub use error::{CatalogError, SessionError};
pub use session::{AvailableTutorial, Navigation, StepOutcome, TutorialSession};
