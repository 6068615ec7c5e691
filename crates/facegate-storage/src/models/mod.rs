pub mod access_event;
pub mod enrollment;

pub use access_event::{AccessEvent, AccessOutcome};
pub use enrollment::{EnrollmentSummary, SampleRow};
