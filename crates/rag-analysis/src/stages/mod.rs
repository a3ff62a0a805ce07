//! Analysis stages.
//!
//! - [`qa`]: question answering
//! - [`validation`]: change validation
//! - [`impact`]: impact analysis
//! - [`decision`]: decision synthesis (no retrieval)

pub mod decision;
pub mod impact;
pub mod qa;
pub mod validation;

pub use decision::DecisionStage;
pub use impact::ImpactStage;
pub use qa::QaStage;
pub use validation::ValidationStage;
