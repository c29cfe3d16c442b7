pub mod application;
pub mod billing;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use db::{create_pool, DbPool};
pub use state::AppState;

use handlers::{bills, customers, dashboard, inventory, orders, payments, products, ApiDoc};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Base64 bill images are up to 5 MiB decoded, a third more on the wire.
const JSON_LIMIT: usize = 8 * 1024 * 1024;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .service(
                web::scope("/customers")
                    .route("", web::get().to(customers::list_customers))
                    .route("", web::post().to(customers::create_customer))
                    .route("/{id}", web::get().to(customers::get_customer))
                    .route("/{id}", web::patch().to(customers::update_customer))
                    .route("/{id}/statement", web::get().to(customers::customer_statement))
                    .route("/{id}/reconcile", web::post().to(customers::reconcile_customer)),
            )
            .service(
                web::scope("/products")
                    .route("", web::get().to(products::list_products))
                    .route("", web::post().to(products::create_product))
                    .route("/{id}", web::get().to(products::get_product))
                    .route("/{id}", web::patch().to(products::update_product))
                    .route("/{id}", web::delete().to(products::delete_product))
                    .route("/{id}/price-increment", web::post().to(products::increment_price)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_orders))
                    .route("", web::post().to(orders::create_order))
                    .route("/preview", web::post().to(orders::preview_order))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}", web::delete().to(orders::delete_order)),
            )
            .service(
                web::scope("/payments")
                    .route("", web::get().to(payments::list_payments))
                    .route("", web::post().to(payments::create_payment))
                    .route("/{id}", web::delete().to(payments::delete_payment)),
            )
            .service(
                web::scope("/inventory")
                    .route("", web::post().to(inventory::add_inventory))
                    .route("/{date}", web::get().to(inventory::list_inventory)),
            )
            .service(
                web::scope("/bills")
                    .route("/daily", web::get().to(bills::daily_bill))
                    .route("/images", web::post().to(bills::upload_image))
                    .route("/images/{name}", web::get().to(bills::get_image))
                    .route("/share", web::post().to(bills::share_bill)),
            )
            .route("/dashboard", web::get().to(dashboard::dashboard))
    })
    .bind((host.to_string(), port))?
    .run())
}
