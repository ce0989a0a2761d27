use actix_web::{HttpResponse, Responder, get, post, web};
use pushkind_common::domain::auth::AuthenticatedUser;

use crate::forms::stock::UndoForm;
use crate::repository::DieselRepository;
use crate::routes::{form_error_response, ledger_error_response, service_error_response};
use crate::services::actors::resolve_actor;
use crate::services::permissions::PermissionRegistry;
use crate::services::transactions::{TransactionsQuery, load_transactions};
use crate::services::undo::undo;

#[get("/v1/transactions")]
/// Transaction log page narrowed to the caller's log tier.
pub async fn list_transactions(
    params: web::Query<TransactionsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };

    match load_transactions(repo.get_ref(), registry.get_ref(), &actor, params.into_inner()) {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => service_error_response(err),
    }
}

#[post("/v1/transactions/{transaction_id}/undo")]
/// Reverse a transaction. Responds with the RESTORE entries written.
pub async fn undo_transaction(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    form: Option<web::Json<UndoForm>>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let note = match form.map(web::Json::into_inner).unwrap_or_default().into_note() {
        Ok(note) => note,
        Err(err) => return form_error_response(err),
    };

    match undo(
        repo.get_ref(),
        registry.get_ref(),
        &actor,
        path.into_inner(),
        note,
    ) {
        Ok(restored) => HttpResponse::Ok().json(restored),
        Err(err) => ledger_error_response(err),
    }
}
