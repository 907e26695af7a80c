//! REST API server for ProofChain
//!
//! Exposes mining, transfer submission, chain reads, peer registration and
//! conflict resolution over HTTP. Peers read each other's chains through the
//! `GET /chain` endpoint served here.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{Block, Blockchain};
use crate::consensus::Consensus;
use crate::error::ChainError;
use crate::miner;
use crate::network::{ChainResponse, HttpChainSource, PeerSet};
use crate::node::NodeState;
use crate::transaction::{Transfer, REWARD_SENDER};

/// Shared handle the HTTP handlers operate on
#[derive(Clone)]
pub struct Node {
    pub blockchain: Arc<RwLock<Blockchain>>,
    pub peers: Arc<RwLock<PeerSet>>,
    // Optional shared orchestrator state (NodeState) for health checks and logging
    pub state: Option<Arc<RwLock<NodeState>>>,
    node_id: String,
    mining_reward: f64,
    chain_source: HttpChainSource,
    blocks_mined: Arc<AtomicU64>,
    api_stats: Arc<RwLock<ApiStats>>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    transfers_submitted: u64,
    resolutions: u64,
    chain_replacements: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl Node {
    /// Create a standalone API node with its own ledger and empty peer set.
    pub fn new(
        blockchain: Blockchain,
        node_id: impl Into<String>,
        mining_reward: f64,
        chain_source: HttpChainSource,
    ) -> Self {
        Self::new_shared(
            Arc::new(RwLock::new(blockchain)),
            Arc::new(RwLock::new(PeerSet::new())),
            node_id,
            mining_reward,
            chain_source,
            None,
        )
    }

    /// Create an API node that shares ledger, peers and orchestrator state
    /// with the `proofchain-node` process so every service sees the same
    /// in-memory chain.
    pub fn new_shared(
        blockchain: Arc<RwLock<Blockchain>>,
        peers: Arc<RwLock<PeerSet>>,
        node_id: impl Into<String>,
        mining_reward: f64,
        chain_source: HttpChainSource,
        state: Option<Arc<RwLock<NodeState>>>,
    ) -> Self {
        Self {
            blockchain,
            peers,
            state,
            node_id: node_id.into(),
            mining_reward,
            chain_source,
            blocks_mined: Arc::new(AtomicU64::new(0)),
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Get total blocks mined by this node
    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined.load(Ordering::Relaxed)
    }

    /// Mine one block on top of the current tip.
    ///
    /// The puzzle is solved on a blocking thread without holding the ledger
    /// lock. If the tip moved meanwhile (another mine or a chain
    /// replacement), the work is discarded and redone against the new tip.
    pub async fn mine(&self) -> Result<Block, ApiError> {
        loop {
            let last_block = self.blockchain.read().await.last_block().clone();
            let last_proof = last_block.proof;

            let started = Instant::now();
            let proof = tokio::task::spawn_blocking(move || miner::proof_of_work(last_proof))
                .await
                .map_err(|e| ApiError::InternalError(format!("Proof-of-work task failed: {}", e)))?;

            let previous_hash = last_block.hash();
            let mut blockchain = self.blockchain.write().await;
            if blockchain.last_block().hash() != previous_hash {
                tracing::debug!(
                    stale_index = last_block.index,
                    "chain tip moved while mining; retrying"
                );
                continue;
            }

            blockchain.queue_transfer(REWARD_SENDER, self.node_id.as_str(), self.mining_reward);
            let block = blockchain.create_block(proof, Some(previous_hash));
            drop(blockchain);

            self.blocks_mined.fetch_add(1, Ordering::SeqCst);
            let user_transfers = block.transfers.iter().filter(|t| !t.is_reward()).count();
            tracing::info!(
                index = block.index,
                proof = block.proof,
                user_transfers,
                reward = self.mining_reward,
                elapsed_ms = %started.elapsed().as_millis(),
                "mined new block"
            );
            return Ok(block);
        }
    }

    /// Poll every registered peer and adopt the longest valid chain.
    ///
    /// Peers are fetched without holding the ledger lock; the comparison and
    /// replacement happen atomically under the write lock against whatever
    /// the local chain is at that moment.
    pub async fn resolve(&self) -> bool {
        let peers = self.peers.read().await.clone();
        let candidates = Consensus::collect_candidates(&peers, &self.chain_source).await;

        let replaced = {
            let mut blockchain = self.blockchain.write().await;
            Consensus::adopt_longest(&mut blockchain, candidates)
        };

        let mut stats = self.api_stats.write().await;
        stats.resolutions += 1;
        if replaced {
            stats.chain_replacements += 1;
        }
        replaced
    }

    /// Get API statistics
    pub async fn get_stats(&self) -> ApiStatsResponse {
        let stats = self.api_stats.read().await;
        let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

        ApiStatsResponse {
            total_requests: stats.total_requests,
            successful_requests: stats.successful_requests,
            failed_requests: stats.failed_requests,
            transfers_submitted: stats.transfers_submitted,
            resolutions: stats.resolutions,
            chain_replacements: stats.chain_replacements,
            uptime_seconds: uptime,
            blocks_mined: self.blocks_mined(),
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
    InvalidInput(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BlockchainError(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct NewTransferRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewTransferResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transfers: Vec<Transfer>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodesResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub transfers_submitted: u64,
    pub resolutions: u64,
    pub chain_replacements: u64,
    pub uptime_seconds: u64,
    pub blocks_mined: u64,
}

// ============================================================================
// Middleware
// ============================================================================

/// Request statistics middleware
async fn stats_middleware(State(node): State<Arc<Node>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    let mut stats = node.api_stats.write().await;
    stats.record_request(success);

    response
}

/// Per-request access log, tagged with the ledger and peer-set sizes seen
/// once the handler has run.
async fn logging_middleware(
    State(node): State<Arc<Node>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let chain_length = node.blockchain.read().await.len();
    let peer_count = node.peers.read().await.len();
    let node_state = match &node.state {
        Some(s) => format!("{:?}", *s.read().await),
        None => "standalone".to_string(),
    };

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = %start.elapsed().as_millis(),
        chain_length,
        peer_count,
        node_state = %node_state,
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        // Ledger endpoints
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/chain", get(full_chain))
        .route("/mempool", get(get_mempool))
        // Peer endpoints
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve_conflicts))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so we always record timing and node-state
        .layer(middleware::from_fn_with_state(node.clone(), logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node)
        .layer(cors)
}

/// Serve the API on `addr` until the process exits.
pub async fn run_api_server(node: Arc<Node>, addr: SocketAddr) -> Result<(), ChainError> {
    let app = build_api_router(node);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let state = match &node.state {
        Some(s) => s.read().await.clone(),
        // No orchestrator state available; assume healthy
        None => NodeState::Ready,
    };

    let (status, label) = if state == NodeState::Ready {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let chain_length = node.blockchain.read().await.len();
    (
        status,
        Json(serde_json::json!({
            "status": label,
            "node_state": format!("{:?}", state),
            "node_id": node.node_id(),
            "chain_length": chain_length,
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

async fn mine(State(node): State<Arc<Node>>) -> Result<Json<MineResponse>, ApiError> {
    let block = node.mine().await?;

    Ok(Json(MineResponse {
        message: "New block forged".to_string(),
        index: block.index,
        transfers: block.transfers,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn new_transaction(
    State(node): State<Arc<Node>>,
    payload: Result<Json<NewTransferRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NewTransferResponse>), ApiError> {
    let Json(req) = payload?;

    let index = node
        .blockchain
        .write()
        .await
        .queue_transfer(req.sender, req.recipient, req.amount);

    node.api_stats.write().await.transfers_submitted += 1;

    Ok((
        StatusCode::CREATED,
        Json(NewTransferResponse {
            message: format!("Transfer will be added to block {}", index),
            index,
        }),
    ))
}

async fn full_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    let blockchain = node.blockchain.read().await;
    Json(ChainResponse::new(blockchain.blocks().to_vec()))
}

async fn get_mempool(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    let transactions = blockchain.mempool().get_all_transactions();
    Json(serde_json::json!({
        "count": transactions.len(),
        "transactions": transactions
    }))
}

async fn register_nodes(
    State(node): State<Arc<Node>>,
    payload: Result<Json<RegisterNodesRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterNodesResponse>), ApiError> {
    let Json(req) = payload?;
    if req.nodes.is_empty() {
        return Err(ApiError::InvalidInput(
            "Please supply a valid list of nodes".to_string(),
        ));
    }

    let mut peers = node.peers.write().await;
    peers.register_all(&req.nodes)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterNodesResponse {
            message: "New nodes have been added".to_string(),
            total_nodes: peers.to_vec(),
        }),
    ))
}

async fn resolve_conflicts(State(node): State<Arc<Node>>) -> Json<ResolveResponse> {
    let replaced = node.resolve().await;
    let chain = node.blockchain.read().await.blocks().to_vec();

    let message = if replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };

    Json(ResolveResponse {
        message: message.to_string(),
        replaced,
        chain,
    })
}

async fn get_api_stats(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(node.get_stats().await)
}
