/// Body composition estimation and its population reference data
pub mod metrics;
pub mod scales;

pub use metrics::{compute_body_composition, compute_body_composition_with, BodyMetrics};
pub use scales::{body_type_name, PopulationReferenceTable, ScaleTable};
