use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

use prople_scribe_core::endorsement::types::{EndorsementError, LedgerBuilder};

#[derive(Deserialize)]
struct SubmitResponse {
    seq_no: u64,
}

/// `LedgerClient` submits signed transactions to the ledger's HTTP gateway
///
/// The gateway accepts the JSON body at `POST {endpoint}/submit` and answers with the assigned
/// `seq_no`. Any non-success status is a rejected write.
#[derive(Clone)]
pub struct LedgerClient {
    client: reqwest::Client,
    endpoint: String,
}

impl LedgerClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LedgerBuilder for LedgerClient {
    async fn submit(&self, signed_payload: Value) -> Result<u64, EndorsementError> {
        let url = format!("{}/submit", self.endpoint);
        debug!("[ledger:submit] url: {}", url);

        let response = self
            .client
            .post(url)
            .json(&signed_payload)
            .send()
            .await
            .map_err(|err| EndorsementError::LedgerSubmitFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EndorsementError::LedgerSubmitFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|err| EndorsementError::LedgerSubmitFailed(err.to_string()))?;

        Ok(submitted.seq_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_submit_success() {
        let mut server = Server::new_async().await;
        let payload = json!({"transaction_id": "tx-1", "payload": {}, "signatures": {}});

        let mock = server
            .mock("POST", "/submit")
            .match_body(Matcher::Json(payload.clone()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"seq_no": 42}"#)
            .create_async()
            .await;

        let client = LedgerClient::new(format!("{}/", server.url()));
        let seq_no = client.submit(payload).await.unwrap();

        assert_eq!(seq_no, 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_rejected() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/submit")
            .with_status(400)
            .with_body("insufficient signatures")
            .create_async()
            .await;

        let client = LedgerClient::new(server.url());
        let result = client.submit(json!({})).await;

        let err = result.unwrap_err();
        assert!(matches!(err, EndorsementError::LedgerSubmitFailed(_)));
        assert!(err.to_string().contains("insufficient signatures"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_malformed_answer() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/submit")
            .with_status(200)
            .with_body(r#"{"accepted": true}"#)
            .create_async()
            .await;

        let client = LedgerClient::new(server.url());
        let result = client.submit(json!({})).await;
        assert!(matches!(
            result.unwrap_err(),
            EndorsementError::LedgerSubmitFailed(_)
        ));
    }
}
