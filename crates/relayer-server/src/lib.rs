// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod routes;

pub use routes::configure;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use anyhow::Result;
use purechance_fhevm::local::LocalOracle;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

pub const DEFAULT_PORT: u16 = 13152;
pub const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Clone)]
pub struct RelayerServerBuilder {
    oracle: Arc<LocalOracle>,
    port: Option<u16>,
    host: Option<String>,
}

impl RelayerServerBuilder {
    /// Create a new builder serving `oracle`
    pub fn new(oracle: Arc<LocalOracle>) -> Self {
        Self {
            oracle,
            port: None,
            host: None,
        }
    }

    /// Set the port number (default: 13152, 0 picks a free port)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the host address (default: "127.0.0.1")
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn build(self) -> RelayerServer {
        RelayerServer {
            oracle: self.oracle,
            port: self.port.unwrap_or(DEFAULT_PORT),
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
        }
    }
}

/// HTTP front of a [`LocalOracle`] speaking the relayer wire format
#[derive(Clone)]
pub struct RelayerServer {
    oracle: Arc<LocalOracle>,
    port: u16,
    host: String,
}

impl RelayerServer {
    pub fn builder(oracle: Arc<LocalOracle>) -> RelayerServerBuilder {
        RelayerServerBuilder::new(oracle)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn oracle(&self) -> &Arc<LocalOracle> {
        &self.oracle
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Bind the listener without running it. Returns the server future and
    /// the address actually bound.
    pub fn bind(&self) -> Result<(Server, SocketAddr)> {
        let oracle = web::Data::from(self.oracle.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(oracle.clone())
                .wrap(Logger::default())
                .configure(configure)
        })
        .workers(1)
        .bind(self.bind_address())?;

        let addr = server
            .addrs()
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no address bound for {}", self.bind_address()))?;
        Ok((server.run(), addr))
    }

    /// Run the HTTP server until it is stopped
    pub async fn run(&self) -> Result<()> {
        let (server, addr) = self.bind()?;
        info!("Relayer listening on http://{}", addr);
        server.await.map_err(Into::into)
    }
}
