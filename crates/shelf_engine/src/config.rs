/* 📖 # Where does configuration come from?

Three layers, later ones win:

1. built-in defaults (`0.0.0.0:3000`, `data`, `public`, 4 workers)
2. an optional `shelf.toml` in the working directory
3. the environment: `PORT`, `SHELF_DATA_DIR`, `SHELF_PUBLIC_DIR`

The environment is passed in as a lookup function so tests never touch the process
environment. The listening address is always all interfaces, [`LISTEN_HOST`]; no layer
can change it.
*/

use serde::Deserialize;

use shelf_base::{FilePath, Pal, ResultExt, ShelfError, ShelfResult};

/// Name of the optional configuration file.
pub const CONFIG_FILE: &str = "shelf.toml";

/// Address the server always binds to.
pub const LISTEN_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WORKERS: usize = 4;

/// Runtime configuration of the shelf server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listening port.
    pub port: u16,
    /// Directory holding the item collection.
    pub data_dir: FilePath,
    /// Directory served as static assets.
    pub public_dir: FilePath,
    /// Number of HTTP worker threads.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: FilePath::from("data"),
            public_dir: FilePath::from("public"),
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Contents of `shelf.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    port: Option<u16>,
    data_dir: Option<String>,
    public_dir: Option<String>,
    workers: Option<usize>,
}

impl Config {
    /// Apply the contents of a `shelf.toml` file.
    pub fn merge_toml(mut self, text: &str) -> ShelfResult<Self> {
        let file: FileConfig = toml::from_str(text)
            .map_err(|e| shelf_base::err!("invalid {}: {}", CONFIG_FILE, e))?;
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(data_dir) = file.data_dir {
            self.data_dir = FilePath::from(data_dir);
        }
        if let Some(public_dir) = file.public_dir {
            self.public_dir = FilePath::from(public_dir);
        }
        if let Some(workers) = file.workers {
            self.workers = workers.max(1);
        }
        Ok(self)
    }

    /// Apply environment overrides looked up through `env`.
    pub fn merge_env<F>(mut self, env: F) -> ShelfResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = env("PORT") {
            self.port = port.trim().parse().map_err(|_| {
                Box::new(ShelfError::validation(format!(
                    "PORT must be a port number, got '{}'",
                    port
                )))
            })?;
        }
        if let Some(data_dir) = env("SHELF_DATA_DIR") {
            self.data_dir = FilePath::from(data_dir);
        }
        if let Some(public_dir) = env("SHELF_PUBLIC_DIR") {
            self.public_dir = FilePath::from(public_dir);
        }
        Ok(self)
    }

    /// Load the configuration: defaults, then `shelf.toml` if present, then `env`.
    pub fn load<F>(pal: &dyn Pal, env: F) -> ShelfResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let file = FilePath::from(CONFIG_FILE);
        if pal.file_exists(&file)? {
            let text = pal.read_file_to_string(&file)?;
            config = config
                .merge_toml(&text)
                .with_context(|| format!("while reading {}", CONFIG_FILE))?;
        }
        config.merge_env(env)
    }
}
