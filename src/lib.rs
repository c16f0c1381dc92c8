use std::net::SocketAddr;

pub mod adapters;
pub mod app;
pub mod config;
pub mod ports;
pub mod push;
pub mod state;
pub mod store;
pub mod types;

mod assets;

pub use push::vapid::{VapidCredentials, generate_vapid_credentials};

pub async fn serve(addr: SocketAddr, config: config::AppConfig) {
    let store = match &config.database {
        Some(path) => store::Store::open_sqlite(path)
            .await
            .unwrap_or_else(|err| panic!("failed to open subscription database: {err}")),
        None => store::Store::memory(),
    };
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app::app(config, store))
        .await
        .expect("server error");
}
