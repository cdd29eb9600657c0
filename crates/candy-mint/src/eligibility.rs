//! Optimistic purchase gate for the UI.
//!
//! `allowed` only enables or disables the mint trigger. Token gates and token
//! payments are surfaced for display and are never checked here: the Candy
//! Guard program enforces them when the transaction lands.

use solana_sdk::pubkey::Pubkey;

use crate::errors::MintError;
use crate::sale::SaleConfiguration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockingReason {
    SoldOut,
    NotConnected,
    InsufficientFunds,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EligibilityDecision {
    pub allowed: bool,
    pub blocking_reason: Option<BlockingReason>,
    pub price_lamports: u64,
    /// (mint, minimum amount)
    pub token_gate: Option<(Pubkey, u64)>,
    /// (mint, amount, destination owner)
    pub token_payment: Option<(Pubkey, u64, Pubkey)>,
    /// A guard exists but the configured group was not found on it.
    pub cohort_missing: bool,
}

impl EligibilityDecision {
    /// The error a purchase attempt reports when this decision blocks it.
    pub fn blocking_error(&self, balance: Option<u64>) -> Option<MintError> {
        self.blocking_reason.map(|reason| match reason {
            BlockingReason::SoldOut => MintError::SoldOut,
            BlockingReason::NotConnected => MintError::NotConnected,
            BlockingReason::InsufficientFunds => MintError::InsufficientFunds {
                balance: balance.unwrap_or(0),
                price: self.price_lamports,
            },
        })
    }
}

/// Decide whether the mint trigger is enabled.
///
/// `balance_lamports` is None when no wallet is connected. Sold out wins over
/// everything; an exact balance is enough.
pub fn evaluate(config: &SaleConfiguration, balance_lamports: Option<u64>) -> EligibilityDecision {
    let price_lamports = config.price_lamports();

    let blocking_reason = if config.remaining_items() == 0 {
        Some(BlockingReason::SoldOut)
    } else {
        match balance_lamports {
            None => Some(BlockingReason::NotConnected),
            Some(balance) if balance < price_lamports => Some(BlockingReason::InsufficientFunds),
            Some(_) => None,
        }
    };

    EligibilityDecision {
        allowed: blocking_reason.is_none(),
        blocking_reason,
        price_lamports,
        token_gate: config.token_gate(),
        token_payment: config.token_payment(),
        cohort_missing: config.cohort_missing(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sale::{Cohort, Rule};

    fn config(total: u64, redeemed: u64, price: u64) -> SaleConfiguration {
        SaleConfiguration {
            candy_machine: Pubkey::new_unique(),
            candy_guard: Some(Pubkey::new_unique()),
            collection_mint: Pubkey::new_unique(),
            collection_update_authority: Pubkey::new_unique(),
            token_standard: 4,
            total_items: total,
            redeemed_items: redeemed,
            base_price_lamports: price,
            bot_tax_lamports: None,
            cohort_labels: vec!["GABU".into()],
            cohort: Some(Cohort {
                label: "GABU".into(),
                guards: Default::default(),
                rules: Vec::new(),
            }),
            eligibility_rules: Vec::new(),
        }
    }

    #[test]
    fn test_sold_out_regardless_of_balance() {
        let c = config(100, 100, 1);
        for balance in [None, Some(0), Some(u64::MAX)] {
            let d = evaluate(&c, balance);
            assert!(!d.allowed);
            assert_eq!(d.blocking_reason, Some(BlockingReason::SoldOut));
        }
    }

    #[test]
    fn test_not_connected() {
        let d = evaluate(&config(100, 0, 0), None);
        assert!(!d.allowed);
        assert_eq!(d.blocking_reason, Some(BlockingReason::NotConnected));
    }

    #[test]
    fn test_balance_boundary_is_inclusive() {
        let c = config(100, 97, 500_000_000);
        let below = evaluate(&c, Some(499_999_999));
        assert!(!below.allowed);
        assert_eq!(below.blocking_reason, Some(BlockingReason::InsufficientFunds));

        let exact = evaluate(&c, Some(500_000_000));
        assert!(exact.allowed);
        assert_eq!(exact.blocking_reason, None);
        assert_eq!(exact.price_lamports, 500_000_000);
    }

    #[test]
    fn test_token_rules_are_display_only() {
        let mut c = config(10, 0, 0);
        let mint = Pubkey::new_unique();
        c.eligibility_rules = vec![
            Rule::BalanceGate { mint, amount: 5 },
            Rule::TokenPayment { mint, amount: 100, destination: Pubkey::new_unique() },
        ];
        // No token balance is known, yet the gate does not block.
        let d = evaluate(&c, Some(0));
        assert!(d.allowed);
        assert_eq!(d.token_gate, Some((mint, 5)));
        assert_eq!(d.token_payment.unwrap().1, 100);
    }

    #[test]
    fn test_cohort_price_overrides_base() {
        let mut c = config(10, 0, 1_000);
        c.eligibility_rules = vec![Rule::SolPayment { lamports: 2_000, destination: Pubkey::new_unique() }];
        let d = evaluate(&c, Some(1_500));
        assert_eq!(d.price_lamports, 2_000);
        assert_eq!(d.blocking_reason, Some(BlockingReason::InsufficientFunds));
        assert_eq!(
            d.blocking_error(Some(1_500)),
            Some(MintError::InsufficientFunds { balance: 1_500, price: 2_000 })
        );
    }
}
