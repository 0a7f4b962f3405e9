use super::{AddChainParams, WalletProvider};
use crate::error::{ChainError, Result};
use crate::types::{ChainChangeEvent, ChainId, TransactionReceipt, TransactionRequest, TxHash};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// EIP-1193 code for "chain has not been added to the wallet".
const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
const USER_REJECTED_CODE: i64 = 4001;
const METHOD_NOT_FOUND_CODE: i64 = -32601;

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// Wallet provider backed by an HTTP JSON-RPC endpoint with unlocked accounts
/// (a local node, or a signer proxy exposing the wallet_* methods).
pub struct JsonRpcProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
    events: broadcast::Sender<ChainChangeEvent>,
}

impl JsonRpcProvider {
    pub fn new(url: &str) -> Result<Self> {
        if url.is_empty() {
            return Err(ChainError::config("RPC URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let (events, _) = broadcast::channel(64);

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
            events,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!("rpc request #{} {}", id, method);

        let response: JsonRpcResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(map_rpc_error(error.code, error.message));
        }

        Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
    }

    /// Plain HTTP has no push channel, so poll the node and emit a
    /// notification whenever its chain id or account list changes. The task
    /// ends once the provider is dropped.
    pub fn watch(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last_chain: Option<ChainId> = None;
            let mut last_accounts: Option<Vec<Address>> = None;

            loop {
                ticker.tick().await;
                let Some(provider) = weak.upgrade() else {
                    break;
                };

                match provider.chain_id().await {
                    Ok(chain_id) => {
                        if last_chain.is_some_and(|previous| previous != chain_id) {
                            let _ = provider.events.send(ChainChangeEvent::ChainChanged(chain_id));
                        }
                        last_chain = Some(chain_id);
                    }
                    Err(e) => tracing::warn!("Chain id poll failed: {}", e),
                }

                match provider.request::<Vec<Address>>("eth_accounts", json!([])).await {
                    Ok(accounts) => {
                        if last_accounts.as_ref().is_some_and(|previous| previous != &accounts) {
                            let _ = provider
                                .events
                                .send(ChainChangeEvent::AccountsChanged(accounts.clone()));
                        }
                        last_accounts = Some(accounts);
                    }
                    Err(e) => tracing::warn!("Account poll failed: {}", e),
                }
            }
        })
    }
}

fn map_rpc_error(code: i64, message: String) -> ChainError {
    if code == UNRECOGNIZED_CHAIN_CODE || message.contains("Unrecognized chain ID") {
        ChainError::UnrecognizedChain(message)
    } else if code == USER_REJECTED_CODE {
        ChainError::UserRejected(message)
    } else {
        ChainError::rpc(code, message)
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn chain_id(&self) -> Result<ChainId> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        ChainId::from_hex(&raw)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self.request("eth_requestAccounts", json!([])).await {
            Err(ChainError::Rpc { code, .. }) if code == METHOD_NOT_FOUND_CODE => {
                // Plain nodes only expose their unlocked accounts.
                self.request("eth_accounts", json!([])).await
            }
            other => other,
        }
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<()> {
        let _: Value = self
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id.hex() }]),
            )
            .await?;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<()> {
        let _: Value = self
            .request("wallet_addEthereumChain", json!([params]))
            .await?;
        Ok(())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash> {
        self.request("eth_sendTransaction", json!([request])).await
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    fn subscribe(&self) -> broadcast::Receiver<ChainChangeEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        assert!(matches!(
            map_rpc_error(4902, "Unrecognized chain".to_string()),
            ChainError::UnrecognizedChain(_)
        ));
        assert!(matches!(
            map_rpc_error(-32603, "Unrecognized chain ID \"0xaa36a7\"".to_string()),
            ChainError::UnrecognizedChain(_)
        ));
        assert!(map_rpc_error(4001, "User rejected".to_string()).is_user_rejection());
        assert!(matches!(
            map_rpc_error(-32000, "boom".to_string()),
            ChainError::Rpc { code: -32000, .. }
        ));
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(JsonRpcProvider::new("").is_err());
    }
}
