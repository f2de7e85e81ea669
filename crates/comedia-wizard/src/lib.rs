//! Método Comedia analysis wizard
//!
//! A fixed six-step guided form for creating and editing structured joke
//! analyses:
//!
//! 1. Identification (title, author)
//! 2. Premise lines
//! 3. Rupture lines
//! 4. Punchline lines
//! 5. Perspective & Concept
//! 6. Formulation & Notes
//!
//! # Architecture
//!
//! ```text
//! UI layer ──commands──▶ WizardController ──▶ WizardState (steps, LineSlots, fields)
//!    ▲                        │
//!    └──── WizardEvent ◀──────┤
//!                             └──▶ AnalysisBackend (create / update / fetch / list / delete /
//!                                                   similar / categories)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use comedia_wizard::prelude::*;
//!
//! # async fn example(backend: impl AnalysisBackend) -> Result<(), Box<dyn std::error::Error>> {
//! let mut wizard = WizardController::new(backend);
//! wizard.set_field(Field::Title, "Aeropuertos");
//! wizard.set_field(Field::Author, "Seinfeld");
//! wizard.advance()?;
//!
//! let key = wizard.add_line(Section::Premise, "¿Qué pasa con la comida de avión?");
//! wizard.edit_line(Section::Premise, key, "¿Qué pasa con los cacahuetes?")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod backend;
pub mod controller;
pub mod error;
pub mod lines;
pub mod record;
pub mod state;
pub mod step;

pub use backend::AnalysisBackend;
pub use controller::{NoticeLevel, WizardController, WizardEvent};
pub use error::{BackendError, LineError, SubmitError, ValidationError, WizardError, WizardResult};
pub use lines::{LineKey, LineSlots, Section};
pub use record::{
    AnalysisId, AnalysisRecord, Category, CategoryKind, Field, ListFilter, SimilarQuery,
    StoredAnalysis, DEFAULT_SIMILAR_LIMIT,
};
pub use state::WizardState;
pub use step::{Step, STEP_COUNT};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosting the wizard
    pub use crate::backend::AnalysisBackend;
    pub use crate::controller::{NoticeLevel, WizardController, WizardEvent};
    pub use crate::error::{BackendError, SubmitError, ValidationError};
    pub use crate::lines::{LineKey, Section};
    pub use crate::record::{AnalysisId, AnalysisRecord, CategoryKind, Field, ListFilter};
    pub use crate::step::Step;
}
