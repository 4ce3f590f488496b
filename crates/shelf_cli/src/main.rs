/* 📖 # Why is the CLI minimal?

The binary takes no arguments. Everything it needs comes from `shelf.toml` and the
environment (see shelf_engine::config), so starting the service is just `shelf` in the
directory holding `data/` and `public/`.

Startup order:
1. Initialize tracing
2. Load the configuration
3. Open the item store ("connect"); on failure log the error and exit 1
4. Serve the API and the public directory until the process is stopped

Exit codes:
- 0: never reached in normal operation, the server runs until killed
- 1: tracing, configuration, store or listener setup failed
*/

use std::env;
use std::process;

use shelf_base::pal::http::HttpServerConfig;
use shelf_base::tracing::init_tracing;
use shelf_base::{Pal, PalHandle, RealPal, ShelfResult};
use shelf_engine::config::LISTEN_HOST;
use shelf_engine::{ApiService, Config, FileStore, StoreHandle};
use tracing::{error, info};

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run() {
        error!(error = ?e, "shelf failed to start");
        process::exit(1);
    }
}

fn run() -> ShelfResult<()> {
    let current_dir =
        env::current_dir().map_err(|e| shelf_base::err!("Failed to get current directory: {}", e))?;
    let pal = PalHandle::new(RealPal::new(current_dir));

    let config = Config::load(&*pal, |key| env::var(key).ok())?;
    info!(
        port = config.port,
        data_dir = %config.data_dir,
        public_dir = %config.public_dir,
        "configuration loaded"
    );

    let store = FileStore::open(pal.clone(), &config.data_dir)?;
    info!("connected to item store");

    let service = ApiService::new(StoreHandle::new(store), pal.clone(), config.public_dir.clone());
    let server_config = HttpServerConfig::new(LISTEN_HOST)
        .with_port(config.port)
        .with_workers(config.workers);
    let handle = pal.start_http_server(Box::new(service), server_config)?;

    info!(port = handle.port(), "Server running on port {}", handle.port());
    handle.wait();
    Ok(())
}
