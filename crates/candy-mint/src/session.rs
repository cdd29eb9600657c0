//! Session state shared between the UI and background jobs.
//!
//! Snapshots are published by replacing the whole `Arc`, so a reader either
//! sees the previous read or the new one, never a mix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use spl_associated_token_account::get_associated_token_address;
use tracing::{info, warn};

use crate::accounts::token::read_token_amount;
use crate::chain::{ChainClient, RpcChain};
use crate::config::MintConfig;
use crate::descriptor::{DescriptorFetcher, HttpDescriptorFetcher};
use crate::eligibility::{evaluate, EligibilityDecision};
use crate::errors::{MintError, Result};
use crate::purchase::{PurchaseOrchestrator, PurchaseResult};
use crate::reader::read_sale;
use crate::sale::{Identity, SaleSnapshot};

pub struct MintSession {
    config: MintConfig,
    chain: Arc<dyn ChainClient>,
    fetcher: Arc<dyn DescriptorFetcher>,
    wallet: Option<Arc<Keypair>>,
    snapshot: RwLock<Option<Arc<SaleSnapshot>>>,
    identity: RwLock<Option<Identity>>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MintSession {
    pub fn new(
        config: MintConfig,
        chain: Arc<dyn ChainClient>,
        fetcher: Arc<dyn DescriptorFetcher>,
        wallet: Option<Keypair>,
    ) -> Self {
        Self {
            config,
            chain,
            fetcher,
            wallet: wallet.map(Arc::new),
            snapshot: RwLock::new(None),
            identity: RwLock::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Session over a JSON-RPC node and HTTP descriptor fetches.
    pub fn connect(config: MintConfig, wallet: Option<Keypair>) -> Self {
        let chain = Arc::new(RpcChain::new(&config.rpc_url(), config.rpc_timeout));
        let fetcher = Arc::new(HttpDescriptorFetcher::new(config.http_timeout));
        Self::new(config, chain, fetcher, wallet)
    }

    pub fn config(&self) -> &MintConfig {
        &self.config
    }

    pub fn wallet_address(&self) -> Option<Pubkey> {
        self.wallet.as_ref().map(|w| w.pubkey())
    }

    pub fn snapshot(&self) -> Option<Arc<SaleSnapshot>> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        *self.identity.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Read the sale from chain and publish it.
    pub fn refresh_sale(&self) -> Result<Arc<SaleSnapshot>> {
        let snapshot = Arc::new(read_sale(
            self.chain.as_ref(),
            self.fetcher.as_ref(),
            self.config.candy_machine.as_ref(),
            &self.config.group_label,
        )?);
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Re-read the wallet balance. None when no wallet is connected.
    pub fn refresh_identity(&self) -> Result<Option<Identity>> {
        let identity = match self.wallet_address() {
            Some(address) => Some(Identity {
                address,
                lamports: self.chain.balance(&address)?,
            }),
            None => None,
        };
        *self.identity.write().unwrap_or_else(|e| e.into_inner()) = identity;
        Ok(identity)
    }

    /// Eligibility of the current snapshot for the current identity.
    pub fn decision(&self) -> Option<EligibilityDecision> {
        let snapshot = self.snapshot()?;
        Some(evaluate(&snapshot.config, self.identity().map(|i| i.lamports)))
    }

    /// The wallet's balance of `mint`, read on demand. Zero when the token
    /// account does not exist; None without a wallet.
    pub fn token_balance(&self, mint: &Pubkey) -> Result<Option<u64>> {
        let Some(owner) = self.wallet_address() else {
            return Ok(None);
        };
        let ata = get_associated_token_address(&owner, mint);
        let amount = self
            .chain
            .account_data(&ata)?
            .and_then(|data| read_token_amount(&data))
            .unwrap_or(0);
        Ok(Some(amount))
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn can_purchase(&self) -> bool {
        !self.is_in_flight() && self.decision().is_some_and(|d| d.allowed)
    }

    /// Mint one item through the configured group.
    ///
    /// Only one attempt runs at a time. The sale is re-read after every
    /// attempt that got past the in-flight check, whether it succeeded or not.
    pub fn purchase(&self) -> Result<PurchaseResult> {
        let _in_flight = self.claim()?;

        let outcome = self.attempt();
        match &outcome {
            Ok(result) => info!(
                asset = %result.minted_asset_id,
                signature = %result.signature,
                name = %result.name,
                "mint complete"
            ),
            Err(e) => warn!("mint failed: {}", e),
        }

        if let Err(e) = self.refresh_sale() {
            warn!("sale re-read after mint failed: {}", e);
        }
        outcome
    }

    fn claim(&self) -> Result<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MintError::AttemptInFlight)?;
        Ok(InFlight(&self.in_flight))
    }

    fn attempt(&self) -> Result<PurchaseResult> {
        let wallet = self.wallet.clone().ok_or(MintError::NotConnected)?;
        let snapshot = self
            .snapshot()
            .ok_or_else(|| MintError::StaleState("sale configuration not loaded".into()))?;
        let config = &snapshot.config;
        if config.candy_guard.is_none() {
            return Err(MintError::StaleState("candy guard not found".into()));
        }
        if config.cohort.is_none() {
            return Err(MintError::StaleState(format!(
                "guard group '{}' not found",
                self.config.group_label
            )));
        }

        let identity = self.refresh_identity()?.ok_or(MintError::NotConnected)?;
        let decision = evaluate(config, Some(identity.lamports));
        if let Some(err) = decision.blocking_error(Some(identity.lamports)) {
            return Err(err);
        }

        info!(
            candy_machine = %config.candy_machine,
            price = decision.price_lamports,
            "starting mint"
        );
        PurchaseOrchestrator {
            chain: self.chain.as_ref(),
            fetcher: self.fetcher.as_ref(),
            submit: self.config.submit,
            compute_unit_limit: self.config.compute_unit_limit,
        }
        .execute(config, &wallet)
    }
}
