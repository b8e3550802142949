pub mod assessments;
pub mod submissions;
pub mod users;

pub use assessments::PgAssessmentStore;
pub use submissions::PgSubmissionStore;
pub use users::PgUserStore;
