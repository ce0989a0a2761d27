use actix_web::{HttpResponse, Responder, get, put, web};
use pushkind_common::domain::auth::AuthenticatedUser;

use crate::forms::permissions::RolePermissionForm;
use crate::repository::DieselRepository;
use crate::routes::{form_error_response, ledger_error_response, service_error_response};
use crate::services::actors::resolve_actor;
use crate::services::permissions::{
    PermissionRegistry, read_role_permission, update_role_permission,
};

#[get("/v1/permissions/{level}")]
pub async fn show_role_permission(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };

    match read_role_permission(registry.get_ref(), &actor, path.into_inner()) {
        Ok(rule) => HttpResponse::Ok().json(rule),
        Err(err) => ledger_error_response(err),
    }
}

#[put("/v1/permissions/{level}")]
/// Store a new rule for the level and publish it to live sessions.
pub async fn save_role_permission(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
    form: web::Json<RolePermissionForm>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let rule = match form.into_inner().into_rule(path.into_inner()) {
        Ok(rule) => rule,
        Err(err) => return form_error_response(err),
    };

    match update_role_permission(repo.get_ref(), registry.get_ref(), &actor, rule) {
        Ok(stored) => HttpResponse::Ok().json(stored),
        Err(err) => ledger_error_response(err),
    }
}
