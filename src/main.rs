use recuerdamed::api::{server, ApiContext};
use recuerdamed::{config, db};

#[tokio::main]
async fn main() {
    recuerdamed::init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let data_dir = config::app_data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!("cannot create data directory {}: {e}", data_dir.display());
        std::process::exit(1);
    }

    let conn = match db::open_database(&config::database_path()) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("cannot open database: {e}");
            std::process::exit(1);
        }
    };

    let ctx = ApiContext::new(conn);
    if let Err(e) = server::serve(ctx, config::bind_addr()).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
