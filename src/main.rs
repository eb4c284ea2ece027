use std::time::Duration;

use actix_web::web;
use clap::Parser;
use log::info;
use uuid::Uuid;

use rustledger::api::server::{run_server, AppState};

#[derive(Parser)]
#[command(name = "rustledger", about = "A single-node ledger with naive multi-node conflict resolution")]
struct Args {
    /// Address to bind the HTTP API to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Seconds between background conflict-resolution passes
    #[arg(long, default_value_t = 10)]
    sync_interval: u64,

    /// Peers to register at startup, as URIs or host:port
    #[arg(long = "peer")]
    peers: Vec<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let node_id = Uuid::new_v4().simple().to_string();
    info!("node identifier: {node_id}");

    let state = web::Data::new(AppState::new(node_id));
    for peer in &args.peers {
        state
            .peers
            .lock()
            .expect("peer set mutex poisoned")
            .register(peer)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    }

    run_server(
        state,
        (args.host, args.port),
        Duration::from_secs(args.sync_interval),
    )
    .await
}
