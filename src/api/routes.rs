//! Route table.

use actix_web::web;

use super::handlers;

/// Registers every endpoint under `/api` plus `/health`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health)).service(
        web::scope("/api")
            .service(
                web::scope("/administrations")
                    .route("", web::get().to(handlers::list_administered))
                    .route("", web::post().to(handlers::record_administration))
                    .route("/form", web::get().to(handlers::administration_form))
                    .route("/prescriptions", web::get().to(handlers::approved_prescriptions))
                    .route("/{id}", web::put().to(handlers::edit_administration))
                    .route("/{id}", web::delete().to(handlers::delete_administration)),
            )
            .service(
                web::scope("/patients")
                    .route("", web::get().to(handlers::list_patients))
                    .route("", web::post().to(handlers::create_patient))
                    .route("/timeline", web::get().to(handlers::patient_timeline)),
            )
            .service(
                web::scope("/vitals")
                    .route("", web::post().to(handlers::record_vital))
                    .route("/{id}", web::delete().to(handlers::delete_vital)),
            )
            .service(
                web::scope("/treatments")
                    .route("", web::post().to(handlers::record_treatment))
                    .route("/{id}", web::delete().to(handlers::delete_treatment)),
            )
            .service(
                web::scope("/prescriptions")
                    .route("", web::post().to(handlers::create_prescription))
                    .route("/counts", web::get().to(handlers::status_counts))
                    .route("/quick-action", web::post().to(handlers::quick_action))
                    .route("/{id}/status", web::post().to(handlers::handle_status)),
            )
            .service(
                web::scope("/medications")
                    .route("", web::get().to(handlers::list_medications))
                    .route("", web::post().to(handlers::create_medication))
                    .route("/stock", web::get().to(handlers::stock_report))
                    .route("/{id}", web::put().to(handlers::update_medication))
                    .route("/{id}", web::delete().to(handlers::delete_medication)),
            )
            .service(
                web::scope("/wards")
                    .route("", web::get().to(handlers::list_wards))
                    .route("", web::post().to(handlers::create_ward))
                    .route("/{id}", web::delete().to(handlers::delete_ward)),
            )
            .service(
                web::scope("/beds")
                    .route("", web::get().to(handlers::list_beds))
                    .route("", web::post().to(handlers::create_bed))
                    .route("/{id}/occupied", web::put().to(handlers::set_bed_occupied))
                    .route("/{id}", web::delete().to(handlers::delete_bed)),
            )
            .route("/dashboard", web::get().to(handlers::admin_dashboard)),
    );
}
