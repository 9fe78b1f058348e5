//! Intent classification: pure pattern classifiers and the precedence
//! router that orders them.

pub mod patterns;
pub mod router;

pub use patterns::{Classifiers, PatientGroup, ProviderSearchMatch, Urgency};
pub use router::{RouteMatch, Router};
