use std::env;
use std::time::Duration;

use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, rt, web};
use dotenvy::dotenv;
use pushkind_common::db::establish_connection_pool;
use pushkind_common::models::config::CommonServerConfig;

use pushkind_inventory::config::InventoryConfig;
use pushkind_inventory::repository::DieselRepository;
use pushkind_inventory::routes::permissions::{save_role_permission, show_role_permission};
use pushkind_inventory::routes::stock::{
    add_batch, adjust, archive_batch, move_stock, mutate_batch, ship_outbound, show_stock,
};
use pushkind_inventory::routes::stores::{archive_product, list_products, list_stores};
use pushkind_inventory::routes::transactions::{list_transactions, undo_transaction};
use pushkind_inventory::services::permissions::{PermissionRegistry, refresh_blocking};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let config = InventoryConfig::from_env();

    let secret = env::var("SECRET_KEY");
    let secret_key = match &secret {
        Ok(key) => Key::from(key.as_bytes()),
        Err(_) => Key::generate(),
    };

    let auth_service_url = match env::var("AUTH_SERVICE_URL") {
        Ok(auth_service_url) => auth_service_url,
        Err(_) => {
            log::error!("AUTH_SERVICE_URL environment variable not set");
            std::process::exit(1);
        }
    };

    let common_config = CommonServerConfig {
        secret: secret.unwrap_or_default(),
        auth_service_url,
    };

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);

    let registry = PermissionRegistry::new();
    match registry.refresh(&repo) {
        Ok(count) => log::info!("Loaded {count} permission rule overrides"),
        Err(e) => log::warn!("Starting with default permission rules: {e}"),
    }

    let _rule_changes = registry.subscribe(|rule| {
        log::info!(
            "Permission rule for level {} is now logs {} / {}",
            rule.role_level,
            rule.logs_level,
            rule.store_scope.as_str()
        );
    });

    let refresh_registry = registry.clone();
    let refresh_repo = repo.clone();
    let refresh_every = Duration::from_secs(config.permission_refresh_secs);
    rt::spawn(async move {
        let mut interval = rt::time::interval(refresh_every);
        loop {
            interval.tick().await;
            refresh_blocking(refresh_registry.clone(), refresh_repo.clone()).await;
        }
    });

    let domain = config.domain.clone();
    let address = config.address.clone();
    let port = config.port;

    HttpServer::new(move || {
        App::new()
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(Some(format!(".{domain}")))
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(list_stores)
            .service(list_products)
            .service(archive_product)
            .service(show_stock)
            .service(add_batch)
            .service(mutate_batch)
            .service(adjust)
            .service(archive_batch)
            .service(ship_outbound)
            .service(move_stock)
            .service(list_transactions)
            .service(undo_transaction)
            .service(show_role_permission)
            .service(save_role_permission)
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(common_config.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}
