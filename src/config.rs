use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_UPSTREAM_URL: &str = "https://dados.mobilidade.rio/gps/sppo";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub upstream_url: String,
    pub bind_addr: SocketAddr,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Ok(Config {
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
            bind_addr: bind_addr.parse::<SocketAddr>().map_err(|e| {
                anyhow::anyhow!("BIND_ADDR {:?} is not a socket address: {}", bind_addr, e)
            })?,
            user_agent: env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| format!("BusaoRJ/{}", env!("CARGO_PKG_VERSION"))),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            user_agent: format!("BusaoRJ/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
