pub mod participation;
pub mod report;

pub use participation::{
    check_participation, participation_sum, validate_brand_participation, validate_references,
    ParticipationCheck,
};
pub use report::{Anomaly, ConfigWarning, EntityError, ReconciliationDelta, ValidationReport};
