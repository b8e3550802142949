pub mod account;
pub mod assessments;
pub mod submissions;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Submissions
        .route(
            "/api/submissions",
            get(submissions::list).post(submissions::create),
        )
        .route("/api/submissions/search", get(submissions::search))
        .route(
            "/api/submissions/{id}",
            get(submissions::get)
                .put(submissions::update)
                .patch(submissions::partial_update)
                .delete(submissions::delete),
        )
        // Assessments
        .route(
            "/api/assessments",
            get(assessments::list).post(assessments::create),
        )
        .route(
            "/api/assessments/{id}",
            get(assessments::get)
                .put(assessments::update)
                .patch(assessments::partial_update)
                .delete(assessments::delete),
        )
        // Users
        .route("/api/users", get(users::list))
        .route("/api/users/{login}", get(users::get))
        // Account
        .route("/api/activate", get(account::activate))
}
