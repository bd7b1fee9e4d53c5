use std::time::Duration;

use serde_json::Value;

// Error codes shared between the agent proxy and the cluster gateway.
pub(crate) const CODE_USER_REJECTED: i64 = 4001;
pub(crate) const CODE_NOT_AUTHORIZED: i64 = 4100;
pub(crate) const CODE_SIGNING_FAILED: i64 = 4200;
pub(crate) const CODE_ACCOUNT_MISSING: i64 = -32001;
pub(crate) const CODE_ACCOUNT_EXISTS: i64 = -32002;

#[derive(Debug)]
pub(crate) enum RpcFailure {
    Transport(String),
    Rpc { code: i64, message: String },
}

#[derive(Debug, Clone)]
pub(crate) struct RpcClient {
    base_url: String,
    client: reqwest::Client,
}

impl RpcClient {
    /// The transport timeout is a backstop only; the controller enforces the
    /// per-call deadline.
    pub fn build(base_url: String, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to initialize rpc client: {e}"))?;
        Ok(Self { base_url, client })
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        let url = self.base_url.clone();
        self.call_at(&url, method, params).await
    }

    pub async fn call_at(
        &self,
        url: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcFailure> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(format!("rpc request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(format!("rpc json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(RpcFailure::Transport(format!("rpc status {status}: {body}")));
        }
        if let Some(err) = body.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown rpc error")
                .to_owned();
            return Err(RpcFailure::Rpc { code, message });
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| RpcFailure::Transport("rpc response missing result".to_owned()))
    }
}
