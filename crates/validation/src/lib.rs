//! Step Validation
//!
//! Validator registry, built-in bubble-game criteria, the step timer and the
//! presentation and event surfaces.

#![warn(missing_docs)]

pub mod engine;
pub mod validator;
pub mod builtin;
pub mod registry;
pub mod live;
pub mod surface;
pub mod timer;

pub use engine::ValidationEngine;
pub use validator::{FnValidator, Validator, ValidatorOutput, GENERIC_FAILURE};
pub use builtin::SPECIAL_BUBBLE_TYPES;
pub use registry::ValidatorRegistry;
pub use live::{DisconnectedState, LiveState, SnapshotState};
pub use surface::{ChannelEventSink, EventSink, LogEventSink, LogPresenter, Presenter};
pub use timer::StepTimer;
