use std::{fs::write, path::PathBuf, time::Duration};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use log::{debug, info};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    /// the address the server should bind to
    pub listen: String,
    /// The JSON file the content store is seeded from
    pub content_path: PathBuf,
    /// Time budget of a single graphql request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub connections: ConnectionSettings,
    #[serde(default)]
    pub loader: LoaderSettings,
}

/// Page size limits of every connection
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Used when neither ``first`` nor ``last`` is given
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Larger requests are clamped to this silently
    #[serde(default = "max_page_size")]
    pub max_page_size: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: max_page_size(),
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoaderSettings {
    /// How long a loader waits for more keys before it fetches a batch
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl LoaderSettings {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_delay_ms: default_batch_delay(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    10
}

fn max_page_size() -> usize {
    100
}

fn default_batch_delay() -> u64 {
    1
}

fn default_max_batch_size() -> usize {
    1000
}

impl Config {
    /// Load the configuration
    ///
    /// The default path is a file called `config.toml` in $PWD/config.toml
    pub fn load() -> anyhow::Result<Self> {
        // either read the path for the config from the env <CRATE_NAME>_CONFIG
        // or use the default path relativ to the executable
        let path: PathBuf = match std::env::var(concat!(env!("CARGO_CRATE_NAME"), "_CONFIG")) {
            Ok(path) => path.into(),
            Err(e) => {
                debug!("Cannot read env var for config path: {}", e);
                std::env::current_dir()?.join("config.toml")
            }
        };

        // write the sample config to the file only if it does not exist
        if !path.exists() {
            info!("Creating config with default options at {}", path.display());
            write(&path, include_str!("../other/config.sample"))?;
        }

        info!("Reading config from {}", path.display());
        Ok(Figment::new()
            // first read the config file
            .merge(Toml::file(path))
            // and then let the env overwrite options
            .merge(Env::prefixed("CONTENT_GRAPH_").split("__"))
            .extract()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[test]
fn test_parse_default_config() {
    use figment::providers::{Data, Toml};
    // ensure that the default config is valid and can be parsed
    let config: Config = Figment::new()
        .merge(Data::<Toml>::string(include_str!("../other/config.sample")))
        .extract()
        .expect("default config is malformed");
    assert_eq!(config.connections, ConnectionSettings::default());
    assert_eq!(config.loader, LoaderSettings::default());
}

#[test]
fn test_sections_are_optional() {
    use figment::providers::{Data, Toml};
    let config: Config = Figment::new()
        .merge(Data::<Toml>::string(
            "listen = \"127.0.0.1:8000\"\ncontent_path = \"content.json\"\n[connections]\nmax_page_size = 5\n",
        ))
        .extract()
        .expect("minimal config is malformed");
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.connections.max_page_size, 5);
    assert_eq!(config.connections.default_page_size, 10);
    assert_eq!(config.loader.max_batch_size, 1000);
}
