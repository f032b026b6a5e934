use axum::{routing::get, Router};

pub mod academics;
pub mod billing;
pub mod class_groups;
pub mod common;
pub mod enrollment;
pub mod saft;
pub mod staff;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/school-years", academics::school_years())
        .nest("/courses", academics::courses())
        .nest("/classes", academics::class_levels())
        .nest("/subjects", academics::subjects())
        .nest("/rooms", academics::rooms())
        .nest("/periods", academics::periods())
        .nest("/class-groups", class_groups::class_groups())
        .nest("/curriculum", class_groups::curriculum())
        .nest("/teachers", staff::teachers())
        .nest("/assignments", staff::assignments())
        .nest("/students", enrollment::students())
        .nest("/enrollments", enrollment::enrollments())
        .nest("/fee-items", billing::fee_items())
        .nest("/invoices", billing::invoices())
        .nest("/saft", saft::router())
}
