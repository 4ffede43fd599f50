//! JSON handlers. Each one extracts the acting staff member, calls a single
//! core procedure and serialises its result.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::CurrentUser;
use crate::core::timeline::TimelineQuery;
use crate::core::WardService;
use crate::error::Result;
use crate::models::administration::{AdministerRequest, AdministeredFilter, EditAdministrationRequest};
use crate::models::medication::{MedicationUpdate, NewMedication};
use crate::models::patient::NewPatient;
use crate::models::prescription::{NewPrescription, QuickAction, StatusAction};
use crate::models::vital::{NewTreatment, NewVital};
use crate::models::ward::{NewBed, NewWard};

type Service = web::Data<WardService>;

#[derive(Debug, Deserialize)]
pub struct FormQuery {
    pub patient_id: i64,
    pub medication_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PrescriptionLookup {
    pub patient_id: i64,
    pub medication_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub action: StatusAction,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuickActionRequest {
    pub action: QuickAction,
}

#[derive(Debug, Deserialize)]
pub struct OccupiedRequest {
    pub occupied: bool,
}

fn created(id: i64) -> HttpResponse {
    HttpResponse::Created().json(json!({ "id": id }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// ===== Administration =====

pub async fn record_administration(
    service: Service,
    user: CurrentUser,
    body: web::Json<AdministerRequest>,
) -> Result<HttpResponse> {
    let id = service.record_administration(&user, body.into_inner()).await?;
    Ok(created(id))
}

pub async fn edit_administration(
    service: Service,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<EditAdministrationRequest>,
) -> Result<HttpResponse> {
    service
        .edit_administration(&user, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_administration(
    service: Service,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    service.delete_administration(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn administration_form(
    service: Service,
    user: CurrentUser,
    query: web::Query<FormQuery>,
) -> Result<HttpResponse> {
    let form = service
        .administration_form(&user, query.patient_id, query.medication_id)
        .await?;
    Ok(HttpResponse::Ok().json(form))
}

pub async fn approved_prescriptions(
    service: Service,
    user: CurrentUser,
    query: web::Query<PrescriptionLookup>,
) -> Result<HttpResponse> {
    let options = service
        .approved_prescriptions(&user, query.patient_id, query.medication_id)
        .await?;
    Ok(HttpResponse::Ok().json(options))
}

pub async fn list_administered(
    service: Service,
    user: CurrentUser,
    query: web::Query<AdministeredFilter>,
) -> Result<HttpResponse> {
    let rows = service.list_administered(&user, &query).await?;
    Ok(HttpResponse::Ok().json(rows))
}

// ===== Patients and records =====

pub async fn list_patients(service: Service, user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_patients(&user).await?))
}

pub async fn create_patient(
    service: Service,
    user: CurrentUser,
    body: web::Json<NewPatient>,
) -> Result<HttpResponse> {
    Ok(created(service.create_patient(&user, body.into_inner()).await?))
}

pub async fn patient_timeline(
    service: Service,
    user: CurrentUser,
    query: web::Query<TimelineQuery>,
) -> Result<HttpResponse> {
    let timeline = service.build_patient_timeline(&user, &query).await?;
    Ok(HttpResponse::Ok().json(timeline))
}

pub async fn record_vital(
    service: Service,
    user: CurrentUser,
    body: web::Json<NewVital>,
) -> Result<HttpResponse> {
    Ok(created(service.record_vital(&user, body.into_inner()).await?))
}

pub async fn delete_vital(service: Service, user: CurrentUser, path: web::Path<i64>) -> Result<HttpResponse> {
    service.delete_vital(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn record_treatment(
    service: Service,
    user: CurrentUser,
    body: web::Json<NewTreatment>,
) -> Result<HttpResponse> {
    Ok(created(service.record_treatment(&user, body.into_inner()).await?))
}

pub async fn delete_treatment(
    service: Service,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    service.delete_treatment(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ===== Prescriptions =====

pub async fn create_prescription(
    service: Service,
    user: CurrentUser,
    body: web::Json<NewPrescription>,
) -> Result<HttpResponse> {
    Ok(created(service.create_prescription(&user, body.into_inner()).await?))
}

pub async fn handle_status(
    service: Service,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<StatusRequest>,
) -> Result<HttpResponse> {
    let StatusRequest { action, reason } = body.into_inner();
    let status = service
        .handle_status(&user, path.into_inner(), action, reason)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "status": status })))
}

pub async fn quick_action(
    service: Service,
    user: CurrentUser,
    body: web::Json<QuickActionRequest>,
) -> Result<HttpResponse> {
    let moved = service.quick_action(&user, body.action).await?;
    Ok(HttpResponse::Ok().json(json!({ "updated": moved })))
}

pub async fn status_counts(service: Service, user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.status_counts(&user).await?))
}

// ===== Inventory =====

pub async fn list_medications(service: Service, user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_medications(&user).await?))
}

pub async fn create_medication(
    service: Service,
    user: CurrentUser,
    body: web::Json<NewMedication>,
) -> Result<HttpResponse> {
    Ok(created(service.create_medication(&user, body.into_inner()).await?))
}

pub async fn update_medication(
    service: Service,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<MedicationUpdate>,
) -> Result<HttpResponse> {
    service
        .update_medication(&user, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_medication(
    service: Service,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    service.delete_medication(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn stock_report(service: Service, user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.stock_report(&user).await?))
}

pub async fn admin_dashboard(service: Service, user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.admin_dashboard(&user).await?))
}

pub async fn list_wards(service: Service, user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_wards(&user).await?))
}

pub async fn create_ward(
    service: Service,
    user: CurrentUser,
    body: web::Json<NewWard>,
) -> Result<HttpResponse> {
    Ok(created(service.create_ward(&user, body.into_inner()).await?))
}

pub async fn delete_ward(service: Service, user: CurrentUser, path: web::Path<i64>) -> Result<HttpResponse> {
    service.delete_ward(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_beds(service: Service, user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_beds(&user).await?))
}

pub async fn create_bed(service: Service, user: CurrentUser, body: web::Json<NewBed>) -> Result<HttpResponse> {
    Ok(created(service.create_bed(&user, body.into_inner()).await?))
}

pub async fn set_bed_occupied(
    service: Service,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<OccupiedRequest>,
) -> Result<HttpResponse> {
    service
        .set_bed_occupied(&user, path.into_inner(), body.occupied)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_bed(service: Service, user: CurrentUser, path: web::Path<i64>) -> Result<HttpResponse> {
    service.delete_bed(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
