use actix_web::{HttpResponse, Responder, delete, get, post, web};
use chrono::Utc;
use pushkind_common::domain::auth::AuthenticatedUser;

use crate::config::InventoryConfig;
use crate::forms::batches::{AdjustBatchForm, ArchiveQuery, CreateBatchForm, MutateBatchForm};
use crate::forms::stock::{OutboundForm, TransferForm};
use crate::repository::DieselRepository;
use crate::routes::stores::ContextQuery;
use crate::routes::{form_error_response, ledger_error_response, service_error_response};
use crate::services::actors::resolve_actor;
use crate::services::allocation::allocate;
use crate::services::ledger::{adjust_batch, apply_mutation, create_batch, delete_batch};
use crate::services::permissions::PermissionRegistry;
use crate::services::stock::{ExpiryWindow, load_stock_overview};
use crate::services::transfer::transfer;

#[get("/v1/stock")]
/// Stock totals per product for a store context.
pub async fn show_stock(
    params: web::Query<ContextQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    config: web::Data<InventoryConfig>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let window = ExpiryWindow {
        today: Utc::now().date_naive(),
        warning_days: config.expiry_warning_days,
    };

    match load_stock_overview(
        repo.get_ref(),
        registry.get_ref(),
        &actor,
        params.store,
        window,
    ) {
        Ok(overview) => HttpResponse::Ok().json(overview),
        Err(err) => service_error_response(err),
    }
}

#[post("/v1/batches")]
pub async fn add_batch(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    form: web::Json<CreateBatchForm>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let request = match form.into_inner().into_request(actor.hub_id) {
        Ok(request) => request,
        Err(err) => return form_error_response(err),
    };

    match create_batch(repo.get_ref(), registry.get_ref(), &actor, request) {
        Ok(receipt) => HttpResponse::Created().json(receipt),
        Err(err) => ledger_error_response(err),
    }
}

#[post("/v1/batches/{batch_id}/mutations")]
pub async fn mutate_batch(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    form: web::Json<MutateBatchForm>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let request = match form.into_inner().into_request(path.into_inner()) {
        Ok(request) => request,
        Err(err) => return form_error_response(err),
    };

    match apply_mutation(repo.get_ref(), registry.get_ref(), &actor, request) {
        Ok(transaction) => HttpResponse::Ok().json(transaction),
        Err(err) => ledger_error_response(err),
    }
}

#[post("/v1/batches/{batch_id}/adjust")]
pub async fn adjust(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    form: web::Json<AdjustBatchForm>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let request = match form.into_inner().into_request(path.into_inner()) {
        Ok(request) => request,
        Err(err) => return form_error_response(err),
    };

    match adjust_batch(repo.get_ref(), registry.get_ref(), &actor, request) {
        Ok(transaction) => HttpResponse::Ok().json(transaction),
        Err(err) => ledger_error_response(err),
    }
}

#[delete("/v1/batches/{batch_id}")]
/// Zero the batch through a DELETE entry and archive it.
pub async fn archive_batch(
    path: web::Path<i32>,
    params: web::Query<ArchiveQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let note = match params.into_inner().into_note() {
        Ok(note) => note,
        Err(err) => return form_error_response(err),
    };

    match delete_batch(
        repo.get_ref(),
        registry.get_ref(),
        &actor,
        path.into_inner(),
        note,
    ) {
        Ok(transaction) => HttpResponse::Ok().json(transaction),
        Err(err) => ledger_error_response(err),
    }
}

#[post("/v1/outbound")]
/// Ship a quantity of one product from one store, soonest expiry first.
pub async fn ship_outbound(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    form: web::Json<OutboundForm>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let order = match form.into_inner().into_order() {
        Ok(order) => order,
        Err(err) => return form_error_response(err),
    };

    match allocate(repo.get_ref(), registry.get_ref(), &actor, order) {
        Ok(transactions) => HttpResponse::Ok().json(transactions),
        Err(err) => ledger_error_response(err),
    }
}

#[post("/v1/transfers")]
pub async fn move_stock(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    form: web::Json<TransferForm>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let request = match form.into_inner().into_request() {
        Ok(request) => request,
        Err(err) => return form_error_response(err),
    };

    match transfer(repo.get_ref(), registry.get_ref(), &actor, request) {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(err) => ledger_error_response(err),
    }
}
