use std::time::SystemTime;

use solana_sdk::pubkey::Pubkey;

use crate::accounts::candy_guard::{CandyGuardAccount, GuardSet};
use crate::accounts::candy_machine::CandyMachineAccount;

/// A single price or eligibility condition of the sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Buyer must hold at least `amount` of `mint`.
    BalanceGate { mint: Pubkey, amount: u64 },
    /// Buyer transfers `amount` of `mint` to `destination` as part of the mint.
    TokenPayment { mint: Pubkey, amount: u64, destination: Pubkey },
    /// Buyer pays `lamports` to `destination`.
    SolPayment { lamports: u64, destination: Pubkey },
}

impl Rule {
    /// Rules in guard-serialization order.
    pub fn from_guards(guards: &GuardSet) -> Vec<Rule> {
        let mut rules = Vec::new();
        if let Some(sp) = guards.sol_payment {
            rules.push(Rule::SolPayment {
                lamports: sp.lamports,
                destination: sp.destination,
            });
        }
        if let Some(tp) = guards.token_payment {
            rules.push(Rule::TokenPayment {
                mint: tp.mint,
                amount: tp.amount,
                destination: tp.destination,
            });
        }
        if let Some(tg) = guards.token_gate {
            rules.push(Rule::BalanceGate {
                mint: tg.mint,
                amount: tg.amount,
            });
        }
        rules
    }
}

/// The guard group the flow mints through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cohort {
    pub label: String,
    /// Default guards merged with the group's guards (what the program enforces).
    pub guards: GuardSet,
    pub rules: Vec<Rule>,
}

/// Normalized view of the on-chain sale.
#[derive(Clone, Debug)]
pub struct SaleConfiguration {
    pub candy_machine: Pubkey,
    pub candy_guard: Option<Pubkey>,
    pub collection_mint: Pubkey,
    pub collection_update_authority: Pubkey,
    pub token_standard: u8,
    pub total_items: u64,
    pub redeemed_items: u64,
    pub base_price_lamports: u64,
    pub bot_tax_lamports: Option<u64>,
    /// Labels of every group on the guard, in account order.
    pub cohort_labels: Vec<String>,
    /// The configured group, when the guard has one with that exact label.
    pub cohort: Option<Cohort>,
    pub eligibility_rules: Vec<Rule>,
}

impl SaleConfiguration {
    pub fn from_accounts(
        candy_machine: Pubkey,
        cm: &CandyMachineAccount,
        guard: Option<(Pubkey, &CandyGuardAccount)>,
        cohort_label: &str,
    ) -> Self {
        let mut config = SaleConfiguration {
            candy_machine,
            candy_guard: None,
            collection_mint: cm.collection_mint,
            collection_update_authority: cm.authority,
            token_standard: cm.token_standard,
            total_items: cm.total_items(),
            redeemed_items: cm.items_redeemed,
            base_price_lamports: 0,
            bot_tax_lamports: None,
            cohort_labels: Vec::new(),
            cohort: None,
            eligibility_rules: Vec::new(),
        };

        let Some((guard_address, guard)) = guard else {
            return config;
        };

        config.candy_guard = Some(guard_address);
        config.base_price_lamports = guard.guards.sol_payment.map(|sp| sp.lamports).unwrap_or(0);
        config.bot_tax_lamports = guard.guards.bot_tax.map(|bt| bt.lamports);
        config.cohort_labels = guard.groups.iter().map(|g| g.label.clone()).collect();

        if let Some(group) = guard.group(cohort_label) {
            let merged = guard.guards.merged_with(&group.guards);
            let rules = Rule::from_guards(&merged);
            config.eligibility_rules = rules.clone();
            config.cohort = Some(Cohort {
                label: group.label.clone(),
                guards: merged,
                rules,
            });
        }

        config
    }

    pub fn remaining_items(&self) -> u64 {
        self.total_items.saturating_sub(self.redeemed_items)
    }

    /// Effective SOL price: the cohort's payment if it has one, else the default.
    pub fn price_lamports(&self) -> u64 {
        self.eligibility_rules
            .iter()
            .find_map(|r| match r {
                Rule::SolPayment { lamports, .. } => Some(*lamports),
                _ => None,
            })
            .unwrap_or(self.base_price_lamports)
    }

    pub fn token_gate(&self) -> Option<(Pubkey, u64)> {
        self.eligibility_rules.iter().find_map(|r| match r {
            Rule::BalanceGate { mint, amount } => Some((*mint, *amount)),
            _ => None,
        })
    }

    pub fn token_payment(&self) -> Option<(Pubkey, u64, Pubkey)> {
        self.eligibility_rules.iter().find_map(|r| match r {
            Rule::TokenPayment { mint, amount, destination } => Some((*mint, *amount, *destination)),
            _ => None,
        })
    }

    /// A guard exists but the configured group does not.
    pub fn cohort_missing(&self) -> bool {
        self.candy_guard.is_some() && self.cohort.is_none()
    }
}

/// One displayable item: its config line plus the fetched descriptor fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayItem {
    pub index: u32,
    pub line_name: String,
    pub uri: String,
    pub name: String,
    pub image: String,
}

/// Everything one read produces. Replaced as a whole, never patched.
#[derive(Clone, Debug)]
pub struct SaleSnapshot {
    pub config: SaleConfiguration,
    pub items: Vec<DisplayItem>,
    pub read_at: SystemTime,
}

/// The connected wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub address: Pubkey,
    pub lamports: u64,
}
