use std::io;

use dairy_ledger::config::Config;
use dairy_ledger::infrastructure::bill_store::LocalBillImageStore;
use dairy_ledger::{build_server, create_pool, run_migrations, AppState};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = create_pool(&config.database_url).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let bill_store =
        LocalBillImageStore::new(config.bill_storage_dir.clone(), &config.public_base_url);
    let state = AppState::new(pool, bill_store);

    log::info!("Starting server at http://{}:{}", config.host, config.port);
    log::info!(
        "Bill images stored in {} and served from {}",
        config.bill_storage_dir.display(),
        config.public_base_url
    );

    build_server(state, &config.host, config.port)?.await
}
