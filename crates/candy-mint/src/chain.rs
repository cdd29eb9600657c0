use std::thread;
use std::time::{Duration, Instant};

use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use tracing::{debug, warn};

use crate::errors::{MintError, Result};

/// How a purchase transaction is sent and confirmed.
#[derive(Clone, Copy, Debug)]
pub struct SubmitOptions {
    pub commitment: CommitmentConfig,
    pub skip_preflight: bool,
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            commitment: CommitmentConfig::finalized(),
            skip_preflight: true,
            confirm_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// The ledger primitives the mint flow needs.
pub trait ChainClient: Send + Sync {
    /// Raw account data, or None if the account does not exist.
    fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Native balance in lamports.
    fn balance(&self, address: &Pubkey) -> Result<u64>;

    fn latest_blockhash(&self) -> Result<Hash>;

    /// Send a signed transaction and block until it reaches `opts.commitment`.
    /// Returns only once the transaction is confirmed; anything else is an error.
    fn submit(&self, tx: &Transaction, opts: &SubmitOptions) -> Result<Signature>;
}

/// `ChainClient` backed by a JSON-RPC node.
pub struct RpcChain {
    rpc: RpcClient,
}

impl RpcChain {
    pub fn new(rpc_url: &str, timeout: Duration) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            rpc_url.to_string(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self { rpc }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

impl ChainClient for RpcChain {
    fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        self.rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .map(|resp| resp.value.map(|account| account.data))
            .map_err(|e| MintError::chain_read(format!("account {}", address), e))
    }

    fn balance(&self, address: &Pubkey) -> Result<u64> {
        self.rpc
            .get_balance(address)
            .map_err(|e| MintError::chain_read(format!("balance of {}", address), e))
    }

    fn latest_blockhash(&self) -> Result<Hash> {
        self.rpc
            .get_latest_blockhash()
            .map_err(|e| MintError::Submission(format!("RPC error: {}", e)))
    }

    fn submit(&self, tx: &Transaction, opts: &SubmitOptions) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: opts.skip_preflight,
            preflight_commitment: Some(self.rpc.commitment().commitment),
            ..Default::default()
        };
        let signature = self
            .rpc
            .send_transaction_with_config(tx, config)
            .map_err(|e| MintError::Submission(e.to_string()))?;
        debug!(%signature, "transaction sent, awaiting {:?}", opts.commitment.commitment);

        let started = Instant::now();
        loop {
            match self.rpc.get_signature_status_with_commitment(&signature, opts.commitment) {
                Ok(Some(Ok(()))) => return Ok(signature),
                Ok(Some(Err(e))) => {
                    return Err(MintError::Submission(format!("{} ({})", e, signature)))
                }
                Ok(None) => {}
                // Status polling is best effort; only the deadline ends the wait.
                Err(e) => warn!(%signature, "signature status poll failed: {}", e),
            }
            if started.elapsed() >= opts.confirm_timeout {
                return Err(MintError::ConfirmationTimeout {
                    signature: signature.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            thread::sleep(opts.poll_interval);
        }
    }
}
