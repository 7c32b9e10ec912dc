//! devassess-core — Session model, state container, persistence and timer.
//!
//! This crate defines the data model, the `AssessmentApi` seam, and the
//! session logic that the devassess client and CLI build on.

pub mod challenge;
pub mod clock;
pub mod error;
pub mod model;
pub mod routes;
pub mod scoring;
pub mod session;
pub mod session_store;
pub mod state;
pub mod storage;
pub mod traits;
pub mod validation;

pub use error::{ApiError, ApiResult, ErrorClass, StorageError};
pub use session::{AssessmentSession, OpenedChallenge, SubmitOutcome};
pub use session_store::SessionStore;
pub use state::{Action, AssessmentState, StateContainer};
pub use traits::{AssessmentApi, Prompter};
