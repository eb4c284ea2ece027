use std::sync::Mutex;
use std::time::Duration;

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::api::client::fetch_chain;
use crate::blockchain::{consensus, ChainSnapshot, Ledger, PeerSet, ProofOfWork, Transaction};

/// Sentinel sender address of mining reward transactions.
const MINING_SENDER: &str = "0";
const MINING_REWARD: u64 = 1;

/// Shared per-process state. The ledger and peer set carry no internal
/// synchronization, so every mutation goes through these mutexes.
pub struct AppState {
    pub ledger: Mutex<Ledger>,
    pub peers: Mutex<PeerSet>,
    pub node_id: String,
}

impl AppState {
    pub fn new(node_id: String) -> AppState {
        AppState {
            ledger: Mutex::new(Ledger::new()),
            peers: Mutex::new(PeerSet::new()),
            node_id,
        }
    }
}

#[derive(Deserialize)]
pub struct TransactionRequest {
    sender: String,
    recipient: String,
    amount: u64,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    nodes: Vec<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct MineResponse {
    message: &'static str,
    index: u64,
    transactions: Vec<Transaction>,
    proof: u64,
    previous_hash: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
    total_nodes: usize,
}

#[derive(Serialize)]
struct ResolveResponse {
    message: &'static str,
    chain: Vec<crate::blockchain::Block>,
}

// GET /mine : search a proof, stage the reward, seal the pending pool
pub async fn mine(state: web::Data<AppState>) -> impl Responder {
    let last_proof = state
        .ledger
        .lock()
        .expect("ledger mutex poisoned")
        .last_block()
        .expect("ledger always has a genesis block")
        .proof;

    // The search is CPU-bound; keep it off the request executors.
    let proof = match web::block(move || ProofOfWork::search(last_proof)).await {
        Ok(proof) => proof,
        Err(err) => {
            error!("proof search task failed: {err}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let mut ledger = state.ledger.lock().expect("ledger mutex poisoned");
    ledger
        .stage_transaction(MINING_SENDER, &state.node_id, MINING_REWARD)
        .expect("ledger always has a genesis block");

    match ledger.seal_block(proof, None) {
        Ok(block) => {
            info!("sealed block #{} with proof {}", block.index, block.proof);
            HttpResponse::Ok().json(MineResponse {
                message: "New Block Forged",
                index: block.index,
                transactions: block.transactions.clone(),
                proof: block.proof,
                previous_hash: block.previous_hash.clone(),
            })
        }
        // The chain moved while we were searching; the proof no longer
        // matches the last block.
        Err(err) => {
            warn!("discarding stale proof: {err}");
            HttpResponse::Conflict().body(err.to_string())
        }
    }
}

// POST /transactions/new : stage a transaction for the next block
pub async fn new_transaction(
    state: web::Data<AppState>,
    req: web::Json<TransactionRequest>,
) -> impl Responder {
    let index = state
        .ledger
        .lock()
        .expect("ledger mutex poisoned")
        .stage_transaction(&req.sender, &req.recipient, req.amount)
        .expect("ledger always has a genesis block");

    debug!("staged transaction {} -> {}", req.sender, req.recipient);
    HttpResponse::Created().json(MessageResponse {
        message: format!("Transaction will be added to Block {index}"),
    })
}

// GET /chain : full chain plus its length
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("ledger mutex poisoned");
    HttpResponse::Ok().json(ChainSnapshot {
        chain: ledger.chain().to_vec(),
        length: ledger.len(),
    })
}

// POST /nodes/register : add peers by URI or host:port
pub async fn register_nodes(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> impl Responder {
    if req.nodes.is_empty() {
        return HttpResponse::BadRequest().body("Error: please supply a list of nodes");
    }

    let mut peers = state.peers.lock().expect("peer set mutex poisoned");
    for address in &req.nodes {
        match peers.register(address) {
            Ok(true) => info!("registered peer {address}"),
            Ok(false) => debug!("peer {address} already registered"),
            Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
        }
    }

    HttpResponse::Created().json(RegisterResponse {
        message: "New nodes have been added",
        total_nodes: peers.len(),
    })
}

// GET /nodes/resolve : run the longest-valid-chain rule on demand
pub async fn resolve_conflicts(state: web::Data<AppState>) -> impl Responder {
    let peers = state.peers.lock().expect("peer set mutex poisoned").clone();
    let http = Client::new();

    let replaced = consensus::resolve(&state.ledger, &peers, |peer| {
        let http = http.clone();
        async move { fetch_chain(&http, &peer).await }
    })
    .await;

    let ledger = state.ledger.lock().expect("ledger mutex poisoned");
    HttpResponse::Ok().json(ResolveResponse {
        message: if replaced {
            "Our chain was replaced"
        } else {
            "Our chain is authoritative"
        },
        chain: ledger.chain().to_vec(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/mine", web::get().to(mine))
        .route("/transactions/new", web::post().to(new_transaction))
        .route("/chain", web::get().to(get_chain))
        .route("/nodes/register", web::post().to(register_nodes))
        .route("/nodes/resolve", web::get().to(resolve_conflicts));
}

/// Start the HTTP node and a background task that re-runs conflict
/// resolution every `sync_interval`.
pub async fn run_server(
    state: web::Data<AppState>,
    address: (String, u16),
    sync_interval: Duration,
) -> std::io::Result<()> {
    let sync_state = state.clone();
    tokio::spawn(async move {
        let http = Client::new();
        let mut ticker = tokio::time::interval(sync_interval);
        loop {
            ticker.tick().await;
            let peers = sync_state.peers.lock().expect("peer set mutex poisoned").clone();
            if peers.is_empty() {
                continue;
            }
            let replaced = consensus::resolve(&sync_state.ledger, &peers, |peer| {
                let http = http.clone();
                async move { fetch_chain(&http, &peer).await }
            })
            .await;
            if replaced {
                info!("background sync adopted a longer peer chain");
            }
        }
    });

    info!("starting rustledger node on {}:{}", address.0, address.1);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(address)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use serde_json::json;

    use super::{configure_routes, AppState};
    use crate::blockchain::{ChainSnapshot, GENESIS_PROOF};

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new("test-node".to_string()))
    }

    #[actix_web::test]
    async fn chain_endpoint_reports_the_genesis_block() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure_routes))
                .await;

        let req = test::TestRequest::get().uri("/chain").to_request();
        let snapshot: ChainSnapshot = test::call_and_read_body_json(&app, req).await;

        assert_eq!(snapshot.length, 1);
        assert_eq!(snapshot.chain[0].index, 1);
        assert_eq!(snapshot.chain[0].proof, GENESIS_PROOF);
    }

    #[actix_web::test]
    async fn staging_a_transaction_returns_created() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure_routes))
                .await;

        let req = test::TestRequest::post()
            .uri("/transactions/new")
            .set_json(json!({"sender": "A", "recipient": "B", "amount": 10}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        let ledger = state.ledger.lock().unwrap();
        assert_eq!(ledger.pending().len(), 1);
        assert_eq!(ledger.pending()[0].recipient, "B");
    }

    #[actix_web::test]
    async fn mining_seals_a_block_carrying_the_reward() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure_routes))
                .await;

        let req = test::TestRequest::get().uri("/mine").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let ledger = state.ledger.lock().unwrap();
        let block = ledger.last_block().unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].sender, "0");
        assert_eq!(block.transactions[0].recipient, "test-node");
        assert!(ledger.pending().is_empty());
    }

    #[actix_web::test]
    async fn registering_nodes_stores_their_authorities() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure_routes))
                .await;

        let req = test::TestRequest::post()
            .uri("/nodes/register")
            .set_json(json!({"nodes": ["http://localhost:5001", "localhost:5002"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        let peers = state.peers.lock().unwrap();
        assert!(peers.contains("localhost:5001"));
        assert!(peers.contains("localhost:5002"));
    }

    #[actix_web::test]
    async fn registering_a_malformed_node_is_rejected() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(configure_routes))
                .await;

        let req = test::TestRequest::post()
            .uri("/nodes/register")
            .set_json(json!({"nodes": ["///nope"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
