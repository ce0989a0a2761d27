use actix_web::{HttpResponse, Responder, delete, get, web};
use pushkind_common::domain::auth::AuthenticatedUser;
use serde::Deserialize;

use crate::domain::store::StoreContext;
use crate::forms::batches::ArchiveQuery;
use crate::repository::DieselRepository;
use crate::routes::{form_error_response, ledger_error_response, service_error_response};
use crate::services::actors::resolve_actor;
use crate::services::ledger::delete_product;
use crate::services::permissions::PermissionRegistry;
use crate::services::scoping::{load_store_tree, load_visible_products};

/// Query parameters shared by store scoped reads.
#[derive(Debug, Default, Deserialize)]
pub struct ContextQuery {
    /// `all` or a store id.
    #[serde(default)]
    pub store: StoreContext,
    pub search: Option<String>,
}

#[get("/v1/stores")]
/// Visible stores grouped as parent and children.
pub async fn list_stores(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };

    match load_store_tree(repo.get_ref(), registry.get_ref(), &actor) {
        Ok(tree) => HttpResponse::Ok().json(tree),
        Err(err) => service_error_response(err),
    }
}

#[get("/v1/products")]
/// Products visible in the requested store context.
pub async fn list_products(
    params: web::Query<ContextQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    registry: web::Data<PermissionRegistry>,
) -> impl Responder {
    let actor = match resolve_actor(repo.get_ref(), &user) {
        Ok(actor) => actor,
        Err(err) => return service_error_response(err),
    };
    let ContextQuery { store, search } = params.into_inner();

    match load_visible_products(
        repo.get_ref(),
        registry.get_ref(),
        &actor,
        store,
        search.as_deref(),
    ) {
        Ok(products) => HttpResponse::Ok().json(products),
        Err(err) => service_error_response(err),
    }
}

#[delete("/v1/products/{product_id}")]
/// Archive a product together with every active batch.
pub async fn archive_product(
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

    match delete_product(
        repo.get_ref(),
        registry.get_ref(),
        &actor,
        path.into_inner(),
        note,
    ) {
        Ok(transactions) => HttpResponse::Ok().json(transactions),
        Err(err) => ledger_error_response(err),
    }
}
