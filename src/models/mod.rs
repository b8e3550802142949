pub mod assessment;
pub mod submission;
pub mod user;

pub use assessment::Assessment;
pub use submission::Submission;
pub use user::User;
