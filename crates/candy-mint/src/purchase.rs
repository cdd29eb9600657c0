//! Purchase orchestration: intent, transaction assembly, submission and
//! resolution of the minted asset.

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use spl_associated_token_account::get_associated_token_address;
use tracing::{info, warn};

use crate::accounts::candy_guard::GuardSet;
use crate::accounts::metadata::{
    collection_delegate_record_pda, decode_metadata, master_edition_pda, metadata_pda,
    token_record_pda,
};
use crate::chain::{ChainClient, SubmitOptions};
use crate::constants::{
    ATA_PROGRAM_ID, CANDY_GUARD_PROGRAM_ID, CANDY_MACHINE_AUTHORITY_SEED,
    CANDY_MACHINE_PROGRAM_ID, IX_MINT_V2, SPL_TOKEN_ID, SYSTEM_PROGRAM_ID,
    SYSVAR_INSTRUCTIONS_ID, SYSVAR_SLOT_HASHES_ID, TOKEN_METADATA_PROGRAM_ID,
};
use crate::descriptor::DescriptorFetcher;
use crate::errors::{MintError, Result};
use crate::sale::SaleConfiguration;

/// `TokenStandard::ProgrammableNonFungible`
pub const TOKEN_STANDARD_PROGRAMMABLE: u8 = 4;

/// A confirmed mint and the descriptor of the new asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseResult {
    pub minted_asset_id: Pubkey,
    pub signature: Signature,
    pub metadata_uri: String,
    pub name: String,
    pub image: String,
}

/// Everything one mint attempt needs. Lives for a single submission.
pub struct PurchaseIntent {
    pub nft_mint: Keypair,
    pub cohort_label: String,
    pub guards: GuardSet,
    pub remaining_accounts: Vec<AccountMeta>,
}

impl PurchaseIntent {
    pub fn new(cohort_label: &str, guards: &GuardSet, payer: &Pubkey) -> Self {
        Self {
            nft_mint: Keypair::new(),
            cohort_label: cohort_label.to_string(),
            guards: guards.clone(),
            remaining_accounts: guard_remaining_accounts(guards, payer, payer),
        }
    }

    /// Enabled guards whose accounts are not derived here. The transaction
    /// carries no remaining accounts for them.
    pub fn unresolved_guards(&self) -> &[&'static str] {
        &self.guards.other
    }
}

/// Token account that receives a token payment: the associated token account
/// of `owner` for `mint`. Pure; no network access.
pub fn payment_destination(mint: &Pubkey, owner: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, mint)
}

pub fn candy_machine_authority_pda(candy_machine: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[CANDY_MACHINE_AUTHORITY_SEED, candy_machine.as_ref()],
        &CANDY_MACHINE_PROGRAM_ID,
    )
    .0
}

/// Accounts each active guard consumes, in guard order.
pub fn guard_remaining_accounts(guards: &GuardSet, payer: &Pubkey, minter: &Pubkey) -> Vec<AccountMeta> {
    let mut accounts = Vec::new();
    if let Some(sp) = guards.sol_payment {
        accounts.push(AccountMeta::new(sp.destination, false));
    }
    if let Some(tp) = guards.token_payment {
        accounts.push(AccountMeta::new(get_associated_token_address(payer, &tp.mint), false));
        accounts.push(AccountMeta::new(payment_destination(&tp.mint, &tp.destination), false));
    }
    if let Some(tg) = guards.token_gate {
        accounts.push(AccountMeta::new_readonly(get_associated_token_address(minter, &tg.mint), false));
    }
    accounts
}

/// Candy Guard `mint_v2` args: `mint_args: Vec<u8>` (empty) and `group: Option<String>`.
fn mint_v2_data(group: &str) -> Vec<u8> {
    let mut data = IX_MINT_V2.to_vec();
    data.extend_from_slice(&0u32.to_le_bytes());
    data.push(1);
    data.extend_from_slice(&(group.len() as u32).to_le_bytes());
    data.extend_from_slice(group.as_bytes());
    data
}

pub fn mint_v2_instruction(
    config: &SaleConfiguration,
    candy_guard: &Pubkey,
    payer: &Pubkey,
    intent: &PurchaseIntent,
) -> Instruction {
    let nft_mint = intent.nft_mint.pubkey();
    let authority_pda = candy_machine_authority_pda(&config.candy_machine);
    let token = get_associated_token_address(payer, &nft_mint);
    // Optional accounts that are not supplied are passed as the invoked program's ID.
    let token_record = if config.token_standard == TOKEN_STANDARD_PROGRAMMABLE {
        token_record_pda(&nft_mint, &token)
    } else {
        CANDY_GUARD_PROGRAM_ID
    };
    let collection_delegate_record = collection_delegate_record_pda(
        &config.collection_mint,
        &config.collection_update_authority,
        &authority_pda,
    );

    let mut accounts = vec![
        AccountMeta::new_readonly(*candy_guard, false),
        AccountMeta::new_readonly(CANDY_MACHINE_PROGRAM_ID, false),
        AccountMeta::new(config.candy_machine, false),
        AccountMeta::new(authority_pda, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new(*payer, true),
        AccountMeta::new(nft_mint, true),
        AccountMeta::new_readonly(*payer, true),
        AccountMeta::new(metadata_pda(&nft_mint), false),
        AccountMeta::new(master_edition_pda(&nft_mint), false),
        AccountMeta::new(token, false),
        AccountMeta::new(token_record, false),
        AccountMeta::new_readonly(collection_delegate_record, false),
        AccountMeta::new_readonly(config.collection_mint, false),
        AccountMeta::new(metadata_pda(&config.collection_mint), false),
        AccountMeta::new_readonly(master_edition_pda(&config.collection_mint), false),
        AccountMeta::new_readonly(config.collection_update_authority, false),
        AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
        AccountMeta::new_readonly(SPL_TOKEN_ID, false),
        AccountMeta::new_readonly(ATA_PROGRAM_ID, false),
        AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
        AccountMeta::new_readonly(SYSVAR_INSTRUCTIONS_ID, false),
        AccountMeta::new_readonly(SYSVAR_SLOT_HASHES_ID, false),
        AccountMeta::new_readonly(CANDY_GUARD_PROGRAM_ID, false), // authorization_rules_program
        AccountMeta::new_readonly(CANDY_GUARD_PROGRAM_ID, false), // authorization_rules
    ];
    accounts.extend(intent.remaining_accounts.iter().cloned());

    Instruction::new_with_bytes(CANDY_GUARD_PROGRAM_ID, &mint_v2_data(&intent.cohort_label), accounts)
}

/// Compute-budget directive followed by the mint, scoped to the intent's cohort.
pub fn build_purchase_instructions(
    config: &SaleConfiguration,
    payer: &Pubkey,
    intent: &PurchaseIntent,
    compute_unit_limit: u32,
) -> Result<Vec<Instruction>> {
    let candy_guard = config
        .candy_guard
        .ok_or_else(|| MintError::StaleState("no candy guard loaded".into()))?;
    Ok(vec![
        ComputeBudgetInstruction::set_compute_unit_limit(compute_unit_limit),
        mint_v2_instruction(config, &candy_guard, payer, intent),
    ])
}

/// Runs one purchase attempt, strictly step by step.
pub struct PurchaseOrchestrator<'a> {
    pub chain: &'a dyn ChainClient,
    pub fetcher: &'a dyn DescriptorFetcher,
    pub submit: SubmitOptions,
    pub compute_unit_limit: u32,
}

impl PurchaseOrchestrator<'_> {
    pub fn execute(&self, config: &SaleConfiguration, wallet: &Keypair) -> Result<PurchaseResult> {
        if config.candy_guard.is_none() {
            return Err(MintError::StaleState("no candy guard loaded".into()));
        }
        let cohort = config.cohort.as_ref().ok_or_else(|| {
            MintError::StaleState(format!(
                "guard group not found (available: {})",
                config.cohort_labels.join(", ")
            ))
        })?;

        let payer = wallet.pubkey();
        let intent = PurchaseIntent::new(&cohort.label, &cohort.guards, &payer);
        let nft_mint = intent.nft_mint.pubkey();
        info!(%nft_mint, group = %intent.cohort_label, "assembling mint transaction");
        if !intent.unresolved_guards().is_empty() {
            warn!(
                guards = ?intent.unresolved_guards(),
                group = %intent.cohort_label,
                "submitting without accounts for these guards; the program may reject the mint"
            );
        }

        let instructions = build_purchase_instructions(config, &payer, &intent, self.compute_unit_limit)?;
        let blockhash = self.chain.latest_blockhash()?;
        let tx = Transaction::new_signed_with_payer(
            &instructions,
            Some(&payer),
            &[wallet, &intent.nft_mint],
            blockhash,
        );

        let signature = self.chain.submit(&tx, &self.submit)?;
        info!(%signature, %nft_mint, "mint finalized");

        resolve_minted(self.chain, self.fetcher, &nft_mint, signature)
    }
}

/// Read the new asset's metadata account and fetch its descriptor.
pub fn resolve_minted(
    chain: &dyn ChainClient,
    fetcher: &dyn DescriptorFetcher,
    nft_mint: &Pubkey,
    signature: Signature,
) -> Result<PurchaseResult> {
    let metadata_address = metadata_pda(nft_mint);
    let data = chain.account_data(&metadata_address)?.ok_or_else(|| {
        MintError::chain_read(
            "minted metadata",
            format!("metadata {} for {} not found after confirmation", metadata_address, nft_mint),
        )
    })?;
    let metadata = decode_metadata(&data)?;
    let descriptor = fetcher.fetch(&metadata.uri)?;

    Ok(PurchaseResult {
        minted_asset_id: *nft_mint,
        signature,
        metadata_uri: metadata.uri,
        name: descriptor.name,
        image: descriptor.image,
    })
}
