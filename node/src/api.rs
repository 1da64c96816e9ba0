//! # REST API
//!
//! Builds the axum router that exposes the wallet over HTTP. All endpoints
//! share application state through axum's `State` extractor and delegate to
//! [`WalletLedger`].
//!
//! ## Endpoints
//!
//! | Method | Path                     | Description                          |
//! |--------|--------------------------|--------------------------------------|
//! | GET    | `/health`                | Liveness probe                       |
//! | GET    | `/api/wallet`            | Default wallet overview              |
//! | GET    | `/api/transactions`      | Default wallet history, newest first |
//! | GET    | `/api/transactions/:id`  | Single transaction                   |
//! | GET    | `/api/gas-estimate`      | Static gas estimate                  |
//! | GET    | `/api/rates`             | Exchange rates                       |
//! | POST   | `/api/transfer`          | Send from a wallet                   |
//! | POST   | `/api/convert`           | Swap between balance slots           |
//! | POST   | `/api/withdraw`          | Withdraw from the default wallet     |
//!
//! Failures are `{ "message": ..., "errors"?: { formErrors, fieldErrors } }`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use vwallet_ledger::pricing::{ExchangeRates, GasEstimate};
use vwallet_ledger::request::{
    ConvertPayload, TransferPayload, WithdrawPayload, INVALID_CONVERSION, INVALID_TRANSFER,
    INVALID_WITHDRAWAL,
};
use vwallet_ledger::transaction::TransactionDisplay;
use vwallet_ledger::wallet::WalletOverview;
use vwallet_ledger::{FieldErrors, LedgerError, SubmissionReceipt, WalletLedger};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone, everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<WalletLedger>,
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Records the outcome of a mutating request and converts it into a
    /// response.
    fn finish(
        &self,
        result: Result<SubmissionReceipt, LedgerError>,
        accepted: &IntCounter,
    ) -> Result<Json<SubmissionReceipt>, ApiError> {
        self.metrics
            .pending_settlements
            .set(self.ledger.settlements().pending() as i64);
        match result {
            Ok(receipt) => {
                accepted.inc();
                Ok(Json(receipt))
            }
            Err(err) => {
                self.metrics.rejected_requests_total.inc();
                Err(ApiError(err))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/wallet", get(wallet_handler))
        .route("/api/transactions", get(transactions_handler))
        .route("/api/transactions/:id", get(transaction_by_id_handler))
        .route("/api/gas-estimate", get(gas_estimate_handler))
        .route("/api/rates", get(rates_handler))
        .route("/api/transfer", post(transfer_handler))
        .route("/api/convert", post(convert_handler))
        .route("/api/withdraw", post(withdraw_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// A [`LedgerError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            LedgerError::Validation { message, errors } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message,
                    errors: Some(errors),
                },
            ),
            LedgerError::InsufficientBalance { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    message,
                    errors: None,
                },
            ),
            err @ (LedgerError::WalletNotFound | LedgerError::TransactionNotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    message: err.to_string(),
                    errors: None,
                },
            ),
            err @ (LedgerError::CorruptBalance { .. } | LedgerError::Overflow { .. }) => {
                tracing::error!(error = %err, "ledger failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "Internal server error".into(),
                        errors: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Turns an unreadable body into the endpoint's validation error.
fn malformed(message: &str, rejection: JsonRejection) -> LedgerError {
    tracing::debug!(%rejection, "rejected request body");
    let mut errors = FieldErrors::new();
    errors.add_form(rejection.body_text());
    LedgerError::Validation {
        message: message.to_string(),
        errors,
    }
}

// ---------------------------------------------------------------------------
// Read Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 while the process is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /api/wallet`
async fn wallet_handler(State(state): State<AppState>) -> Result<Json<WalletOverview>, ApiError> {
    Ok(Json(state.ledger.wallet_overview()?))
}

/// `GET /api/transactions`: an empty list when the default wallet is
/// missing, never an error.
async fn transactions_handler(State(state): State<AppState>) -> Json<Vec<TransactionDisplay>> {
    Json(state.ledger.transactions())
}

/// `GET /api/transactions/:id`
async fn transaction_by_id_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<TransactionDisplay>, ApiError> {
    Ok(Json(state.ledger.transaction(&id)?))
}

async fn gas_estimate_handler(State(state): State<AppState>) -> Json<GasEstimate> {
    Json(state.ledger.gas_estimate())
}

async fn rates_handler(State(state): State<AppState>) -> Json<ExchangeRates> {
    Json(state.ledger.rates())
}

// ---------------------------------------------------------------------------
// Mutating Handlers
// ---------------------------------------------------------------------------

/// `POST /api/transfer`
async fn transfer_handler(
    State(state): State<AppState>,
    body: Result<Json<TransferPayload>, JsonRejection>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let _timer = state.metrics.request_latency_seconds.start_timer();
    let result = match body {
        Ok(Json(payload)) => state.ledger.transfer(&payload).await,
        Err(rejection) => Err(malformed(INVALID_TRANSFER, rejection)),
    };
    state.finish(result, &state.metrics.transfers_submitted_total)
}

/// `POST /api/convert`
async fn convert_handler(
    State(state): State<AppState>,
    body: Result<Json<ConvertPayload>, JsonRejection>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let _timer = state.metrics.request_latency_seconds.start_timer();
    let result = match body {
        Ok(Json(payload)) => state.ledger.convert(&payload).await,
        Err(rejection) => Err(malformed(INVALID_CONVERSION, rejection)),
    };
    state.finish(result, &state.metrics.conversions_total)
}

/// `POST /api/withdraw`
async fn withdraw_handler(
    State(state): State<AppState>,
    body: Result<Json<WithdrawPayload>, JsonRejection>,
) -> Result<Json<SubmissionReceipt>, ApiError> {
    let _timer = state.metrics.request_latency_seconds.start_timer();
    let result = match body {
        Ok(Json(payload)) => state.ledger.withdraw(&payload).await,
        Err(rejection) => Err(malformed(INVALID_WITHDRAWAL, rejection)),
    };
    state.finish(result, &state.metrics.withdrawals_submitted_total)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use vwallet_ledger::config::{LedgerConfig, DEMO_WALLET_ADDRESS};
    use vwallet_ledger::transaction::TransactionStatus;

    const DEST: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    /// Creates a test AppState over the seeded demo ledger.
    fn test_app_state() -> AppState {
        app_state_with(LedgerConfig::default())
    }

    fn app_state_with(config: LedgerConfig) -> AppState {
        AppState {
            ledger: Arc::new(WalletLedger::in_memory(config)),
            metrics: Arc::new(crate::metrics::WalletMetrics::new()),
        }
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// Sends a GET request and returns (status, parsed body).
    async fn get(router: &Router, path: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        send(router, req).await
    }

    /// Sends a POST request with a raw body and returns (status, parsed body).
    async fn post_raw(router: &Router, path: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(router, req).await
    }

    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        post_raw(router, path, &body.to_string()).await
    }

    fn transfer_body(token: &str, amount: &str, to: &str) -> serde_json::Value {
        serde_json::json!({
            "token": token,
            "amount": amount,
            "toAddress": to,
            "fromWalletAddress": DEMO_WALLET_ADDRESS,
        })
    }

    // -- Reads ---------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, json) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn wallet_overview_shape() {
        let router = create_router(test_app_state());
        let (status, json) = get(&router, "/api/wallet").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["address"], DEMO_WALLET_ADDRESS);
        assert_eq!(json["totalValueUsd"], "10312.85");
        assert_eq!(json["tokens"][0]["symbol"], "ETH");
        assert_eq!(json["tokens"][0]["virtualBalance"], "2.5847");
        assert_eq!(json["tokens"][1]["usdValue"], "4250.00");
        assert_eq!(json["recentTransactions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn transaction_list_is_newest_first() {
        let router = create_router(test_app_state());
        let (status, json) = get(&router, "/api/transactions").await;

        assert_eq!(status, StatusCode::OK);
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 4);
        // Seeded withdraw is 30 minutes old, the newest of the four.
        assert_eq!(list[0]["type"], "withdraw");
        assert_eq!(list[0]["status"], "pending");
        assert!(list[0].get("txHash").is_none());
        assert_eq!(list[3]["type"], "convert");
        assert!(list[3]["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn missing_wallet_reads() {
        let router = create_router(app_state_with(LedgerConfig {
            seed_demo_wallet: false,
            ..LedgerConfig::default()
        }));

        let (status, json) = get(&router, "/api/transactions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));

        let (status, json) = get(&router, "/api/wallet").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Wallet not found");
    }

    #[tokio::test]
    async fn unknown_transaction_is_404() {
        let router = create_router(test_app_state());
        let (status, json) = get(&router, "/api/transactions/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Transaction not found");

        let (status, _) = get(
            &router,
            "/api/transactions/00000000-0000-4000-8000-000000000000",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn static_pricing_endpoints() {
        let router = create_router(test_app_state());

        let (status, json) = get(&router, "/api/gas-estimate").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["standard"], "0.002");
        assert_eq!(json["estimatedTimeSeconds"], 30);

        let (status, json) = get(&router, "/api/rates").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ethToUsdc"], 2345.67);
        assert_eq!(json["usdcToEth"], 0.000426);
        assert_eq!(json["usdcPrice"], 1.0);
        assert!(json["lastUpdated"].is_string());
    }

    // -- Transfers -----------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn transfer_is_accepted_then_settled() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, json) =
            post_json(&router, "/api/transfer", transfer_body("ETH", "0.5", DEST)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Transfer submitted successfully");
        let id = json["transactionId"].as_str().unwrap().to_string();

        let (_, wallet) = get(&router, "/api/wallet").await;
        assert_eq!(wallet["tokens"][0]["virtualBalance"], "2.0847");

        let (_, tx) = get(&router, &format!("/api/transactions/{}", id)).await;
        assert_eq!(tx["status"], "pending");
        assert_eq!(tx["toAddress"], DEST);
        assert_eq!(tx["gasFee"], "0.002");

        tokio::time::sleep(std::time::Duration::from_secs(4)).await;
        let (_, tx) = get(&router, &format!("/api/transactions/{}", id)).await;
        let parsed: TransactionDisplay = serde_json::from_value(tx).unwrap();
        assert_eq!(parsed.status, TransactionStatus::Confirmed);
        assert_eq!(parsed.tx_hash.unwrap().len(), 66);

        assert_eq!(state.metrics.transfers_submitted_total.get(), 1);
    }

    #[tokio::test]
    async fn transfer_validation_errors_are_per_field() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, json) =
            post_json(&router, "/api/transfer", transfer_body("ETH", "-1", "0x123")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid transfer request");
        assert_eq!(
            json["errors"]["fieldErrors"]["toAddress"][0],
            "Invalid Ethereum address"
        );
        assert_eq!(
            json["errors"]["fieldErrors"]["amount"][0],
            "Amount must be a positive number"
        );

        let (_, wallet) = get(&router, "/api/wallet").await;
        assert_eq!(wallet["tokens"][0]["virtualBalance"], "2.5847");
        assert_eq!(state.metrics.rejected_requests_total.get(), 1);
    }

    #[tokio::test]
    async fn missing_fields_are_required() {
        let router = create_router(test_app_state());
        let (status, json) = post_json(&router, "/api/withdraw", serde_json::json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid withdrawal request");
        assert_eq!(json["errors"]["fieldErrors"]["token"][0], "Required");
        assert_eq!(json["errors"]["fieldErrors"]["toAddress"][0], "Required");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let router = create_router(test_app_state());
        let (status, json) = post_raw(&router, "/api/convert", "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid conversion request");
        assert_eq!(json["errors"]["formErrors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overdraft_is_rejected() {
        let router = create_router(test_app_state());
        let (status, json) =
            post_json(&router, "/api/transfer", transfer_body("USDC", "4250.01", DEST)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Insufficient balance");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn unknown_source_wallet_is_404() {
        let router = create_router(test_app_state());
        let mut body = transfer_body("ETH", "0.1", DEST);
        body["fromWalletAddress"] = serde_json::json!(DEST);

        let (status, json) = post_json(&router, "/api/transfer", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Wallet not found");
    }

    // -- Convert / Withdraw --------------------------------------------------

    #[tokio::test]
    async fn convert_credits_at_fixed_rate() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, json) = post_json(
            &router,
            "/api/convert",
            serde_json::json!({ "fromToken": "USDQ", "toToken": "USDC", "amount": "1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Conversion completed successfully");

        let (_, wallet) = get(&router, "/api/wallet").await;
        assert_eq!(wallet["tokens"][0]["virtualBalance"], "1.5847");
        assert_eq!(wallet["tokens"][1]["virtualBalance"], "6595.67");
        assert_eq!(wallet["recentTransactions"][0]["status"], "confirmed");
        assert_eq!(state.metrics.conversions_total.get(), 1);
    }

    #[tokio::test]
    async fn convert_overdraft_names_the_token() {
        let router = create_router(test_app_state());
        let (status, json) = post_json(
            &router,
            "/api/convert",
            serde_json::json!({ "fromToken": "WETH", "toToken": "USDQ", "amount": "9999" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Insufficient USDC balance");
    }

    #[tokio::test(start_paused = true)]
    async fn withdraw_debits_default_wallet() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, json) = post_json(
            &router,
            "/api/withdraw",
            serde_json::json!({ "token": "USDC", "amount": "250.5", "toAddress": DEST }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Withdrawal submitted successfully");

        let (_, wallet) = get(&router, "/api/wallet").await;
        assert_eq!(wallet["tokens"][1]["virtualBalance"], "3999.5");
        assert_eq!(state.metrics.pending_settlements.get(), 1);
        assert_eq!(state.metrics.withdrawals_submitted_total.get(), 1);
    }

    #[tokio::test]
    async fn withdraw_to_short_address_is_rejected() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let (status, json) = post_json(
            &router,
            "/api/withdraw",
            serde_json::json!({ "token": "USDC", "amount": "500", "toAddress": "0x123" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid withdrawal request");
        assert_eq!(
            json["errors"]["fieldErrors"]["toAddress"][0],
            "Invalid Ethereum address"
        );

        let (_, wallet) = get(&router, "/api/wallet").await;
        assert_eq!(wallet["tokens"][1]["virtualBalance"], "4250.00");
        let (_, list) = get(&router, "/api/transactions").await;
        assert_eq!(list.as_array().unwrap().len(), 4);
        assert_eq!(state.metrics.withdrawals_submitted_total.get(), 0);
    }

    #[tokio::test]
    async fn underscore_amount_is_rejected() {
        let router = create_router(test_app_state());
        let (status, json) =
            post_json(&router, "/api/transfer", transfer_body("USDC", "1_000", DEST)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["errors"]["fieldErrors"]["amount"][0],
            "Amount must be a positive number"
        );
        let (_, wallet) = get(&router, "/api/wallet").await;
        assert_eq!(wallet["tokens"][1]["virtualBalance"], "4250.00");
    }
}
