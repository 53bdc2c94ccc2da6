use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prople_scribe_rpc::rpc::shared::processor::RpcProcessor;
use prople_scribe_rpc::rpc::shared::types::RpcResponse;
use prople_scribe_rpc::ScribeRPC;

use crate::errors::ScribeError;

async fn rpc_handler(State(processor): State<RpcProcessor>, body: Bytes) -> Json<RpcResponse> {
    Json(processor.execute_bytes(&body).await)
}

/// `build_router` exposes the processor on `POST /rpc`
pub fn build_router(processor: RpcProcessor) -> Router {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .layer((
            TraceLayer::new_for_http(),
            TimeoutLayer::new(Duration::from_secs(10)),
        ))
        .with_state(processor)
}

pub struct RpcServer {
    host: String,
    port: String,
    router: Router,
}

impl RpcServer {
    pub async fn serve(self) -> Result<(), ScribeError> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| ScribeError::ServerError(err.to_string()))?;

        info!("listening on {}", addr);
        axum::serve(listener, self.router)
            .await
            .map_err(|err| ScribeError::ServerError(err.to_string()))
    }
}

pub struct Rpc {
    config: String,
}

impl Rpc {
    pub fn new(config: String) -> Rpc {
        Self { config }
    }

    pub async fn svc(&self) -> Result<RpcServer, ScribeError> {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!(
                        "{}=debug,prople_scribe_rpc=debug,prople_scribe_core=debug,tower_http=debug,axum=trace",
                        env!("CARGO_CRATE_NAME")
                    )
                    .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();

        let scribe_rpc =
            ScribeRPC::new(&self.config).map_err(|err| ScribeError::RpcError(err.to_string()))?;

        let processor = scribe_rpc
            .build_rpc_processor()
            .await
            .map_err(|err| ScribeError::RpcError(err.to_string()))?;

        let (host, port) = scribe_rpc.build_app_config().get_app_config();
        Ok(RpcServer {
            host,
            port,
            router: build_router(processor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{json, Value};

    async fn spawn(processor: RpcProcessor) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(processor)).await.unwrap();
        });

        format!("http://{}/rpc", addr)
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let url = spawn(RpcProcessor::default()).await;

        let response: Value = reqwest::Client::new()
            .post(url)
            .json(&json!({"jsonrpc": "2.0", "method": "prople.scribe.unknown", "id": 1}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let url = spawn(RpcProcessor::default()).await;

        let response: Value = reqwest::Client::new()
            .post(url)
            .body("not json")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(response["error"]["code"], -32700);
    }
}
