//! Sale-configuration reader: raw accounts in, `SaleSnapshot` out.

use std::time::SystemTime;

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::accounts::candy_guard::{decode_candy_guard, is_candy_guard, CandyGuardAccount};
use crate::accounts::candy_machine::{decode_candy_machine, CandyMachineAccount, ConfigLine};
use crate::chain::ChainClient;
use crate::descriptor::{fetch_all, DescriptorFetcher};
use crate::errors::{MintError, Result};
use crate::sale::{DisplayItem, SaleConfiguration, SaleSnapshot};

pub fn fetch_candy_machine(chain: &dyn ChainClient, address: &Pubkey) -> Result<CandyMachineAccount> {
    let data = chain
        .account_data(address)?
        .ok_or_else(|| MintError::chain_read("candy machine", format!("account {} not found", address)))?;
    decode_candy_machine(&data)
}

/// The guard wrapping a machine lives at the machine's mint authority.
/// None when that account is missing or is not a Candy Guard (ungated sale).
pub fn fetch_candy_guard(chain: &dyn ChainClient, address: &Pubkey) -> Result<Option<CandyGuardAccount>> {
    match chain.account_data(address)? {
        Some(data) if is_candy_guard(&data) => decode_candy_guard(&data).map(Some),
        _ => Ok(None),
    }
}

/// Read the whole sale: machine, guard, cohort and display items.
pub fn read_sale(
    chain: &dyn ChainClient,
    fetcher: &dyn DescriptorFetcher,
    candy_machine: Option<&Pubkey>,
    cohort_label: &str,
) -> Result<SaleSnapshot> {
    let candy_machine = candy_machine.ok_or(MintError::ConfigNotFound)?;
    info!(%candy_machine, "reading sale configuration");

    let cm = fetch_candy_machine(chain, candy_machine)?;
    let guard = fetch_candy_guard(chain, &cm.mint_authority)?;
    if guard.is_none() {
        info!(mint_authority = %cm.mint_authority, "no candy guard found, sale is ungated");
    }

    let config = SaleConfiguration::from_accounts(
        *candy_machine,
        &cm,
        guard.as_ref().map(|g| (cm.mint_authority, g)),
        cohort_label,
    );
    if config.cohort_missing() {
        warn!(
            cohort = cohort_label,
            available = ?config.cohort_labels,
            "guard group not found; gate and token payment are not shown"
        );
    }

    let items = resolve_display_items(fetcher, &cm.items);
    info!(
        total = config.total_items,
        redeemed = config.redeemed_items,
        displayable = items.len(),
        "sale configuration loaded"
    );

    Ok(SaleSnapshot {
        config,
        items,
        read_at: SystemTime::now(),
    })
}

/// Fetch each distinct descriptor once and keep the items whose descriptor is valid.
pub fn resolve_display_items(fetcher: &dyn DescriptorFetcher, lines: &[ConfigLine]) -> Vec<DisplayItem> {
    let descriptors = fetch_all(fetcher, lines.iter().map(|l| l.uri.as_str()).filter(|u| !u.is_empty()));

    lines
        .iter()
        .filter_map(|line| match descriptors.get(&line.uri) {
            Some(Ok(d)) => Some(DisplayItem {
                index: line.index,
                line_name: line.name.clone(),
                uri: line.uri.clone(),
                name: d.name.clone(),
                image: d.image.clone(),
            }),
            Some(Err(e)) => {
                debug!(index = line.index, "dropping item: {}", e);
                None
            }
            None => None,
        })
        .collect()
}
