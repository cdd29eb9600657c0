use solana_sdk::pubkey::Pubkey;

use super::{check_discriminator, decode_padded, ByteReader};
use crate::constants::{CANDY_GUARD_DATA_OFFSET, CANDY_GUARD_DISCRIMINATOR, MAX_GROUP_LABEL_SIZE};
use crate::errors::{MintError, Result};

const CONTEXT: &str = "candy guard";

// Feature bits, in the order guards are serialized.
pub const GUARD_BOT_TAX: u32 = 0;
pub const GUARD_SOL_PAYMENT: u32 = 1;
pub const GUARD_TOKEN_PAYMENT: u32 = 2;
pub const GUARD_START_DATE: u32 = 3;
pub const GUARD_TOKEN_GATE: u32 = 5;
pub const GUARD_END_DATE: u32 = 7;

/// (name, serialized size) for every guard, indexed by feature bit.
const GUARD_LAYOUT: [(&str, usize); 21] = [
    ("botTax", 9),
    ("solPayment", 40),
    ("tokenPayment", 72),
    ("startDate", 8),
    ("thirdPartySigner", 32),
    ("tokenGate", 40),
    ("gatekeeper", 33),
    ("endDate", 8),
    ("allowList", 32),
    ("mintLimit", 3),
    ("nftPayment", 64),
    ("redeemedAmount", 8),
    ("addressGate", 32),
    ("nftGate", 32),
    ("nftBurn", 32),
    ("tokenBurn", 40),
    ("freezeSolPayment", 40),
    ("freezeTokenPayment", 72),
    ("programGate", 164),
    ("allocation", 5),
    ("token2022Payment", 72),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BotTax {
    pub lamports: u64,
    pub last_instruction: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolPaymentGuard {
    pub lamports: u64,
    pub destination: Pubkey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPaymentGuard {
    pub amount: u64,
    pub mint: Pubkey,
    /// Stored as `destination_ata` on chain; the mint flow treats it as the
    /// owner and derives the associated token account from it.
    pub destination: Pubkey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenGateGuard {
    pub amount: u64,
    pub mint: Pubkey,
}

/// A decoded guard set. Guards the mint flow does not act on are kept by
/// name only, so they can still be shown and merged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardSet {
    pub bot_tax: Option<BotTax>,
    pub sol_payment: Option<SolPaymentGuard>,
    pub token_payment: Option<TokenPaymentGuard>,
    pub start_date: Option<i64>,
    pub token_gate: Option<TokenGateGuard>,
    pub end_date: Option<i64>,
    /// Names of enabled guards that are not modeled above, in feature order.
    pub other: Vec<&'static str>,
}

impl GuardSet {
    /// Default guards overlaid with a group's guards; the group wins.
    pub fn merged_with(&self, group: &GuardSet) -> GuardSet {
        let mut other: Vec<&'static str> = self.other.clone();
        for name in &group.other {
            if !other.contains(name) {
                other.push(*name);
            }
        }
        other.sort_by_key(|name| guard_bit(name));
        GuardSet {
            bot_tax: group.bot_tax.or(self.bot_tax),
            sol_payment: group.sol_payment.or(self.sol_payment),
            token_payment: group.token_payment.or(self.token_payment),
            start_date: group.start_date.or(self.start_date),
            token_gate: group.token_gate.or(self.token_gate),
            end_date: group.end_date.or(self.end_date),
            other,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == GuardSet::default()
    }
}

fn guard_bit(name: &str) -> usize {
    GUARD_LAYOUT
        .iter()
        .position(|(n, _)| *n == name)
        .unwrap_or(GUARD_LAYOUT.len())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardGroup {
    pub label: String,
    pub guards: GuardSet,
}

/// Decoded Candy Guard account.
#[derive(Clone, Debug)]
pub struct CandyGuardAccount {
    pub base: Pubkey,
    pub bump: u8,
    pub authority: Pubkey,
    pub guards: GuardSet,
    pub groups: Vec<GuardGroup>,
}

impl CandyGuardAccount {
    /// Exact label match among the groups.
    pub fn group(&self, label: &str) -> Option<&GuardGroup> {
        self.groups.iter().find(|g| g.label == label)
    }
}

/// Whether `data` starts with the Candy Guard discriminator.
pub fn is_candy_guard(data: &[u8]) -> bool {
    data.len() >= 8 && data[..8] == CANDY_GUARD_DISCRIMINATOR
}

pub fn decode_candy_guard(data: &[u8]) -> Result<CandyGuardAccount> {
    check_discriminator(data, &CANDY_GUARD_DISCRIMINATOR, CONTEXT)?;
    let mut r = ByteReader::at(data, 8, CONTEXT);
    let base = r.pubkey()?;
    let bump = r.u8()?;
    let authority = r.pubkey()?;
    debug_assert_eq!(r.position(), CANDY_GUARD_DATA_OFFSET);

    let guards = read_guard_set(&mut r)?;

    let group_count = r.u32()?;
    let mut groups = Vec::with_capacity(group_count.min(64) as usize);
    for _ in 0..group_count {
        let label = decode_padded(r.bytes(MAX_GROUP_LABEL_SIZE)?, CONTEXT)?;
        let guards = read_guard_set(&mut r)?;
        groups.push(GuardGroup { label, guards });
    }

    Ok(CandyGuardAccount {
        base,
        bump,
        authority,
        guards,
        groups,
    })
}

fn read_guard_set(r: &mut ByteReader<'_>) -> Result<GuardSet> {
    let features = r.u64()?;
    if features >> GUARD_LAYOUT.len() != 0 {
        return Err(MintError::chain_read(
            CONTEXT,
            format!("unknown guard feature bits {:#x}", features),
        ));
    }

    let mut set = GuardSet::default();
    for (bit, (name, size)) in GUARD_LAYOUT.iter().enumerate() {
        if features & (1u64 << bit) == 0 {
            continue;
        }
        match bit as u32 {
            GUARD_BOT_TAX => {
                set.bot_tax = Some(BotTax {
                    lamports: r.u64()?,
                    last_instruction: r.bool()?,
                })
            }
            GUARD_SOL_PAYMENT => {
                set.sol_payment = Some(SolPaymentGuard {
                    lamports: r.u64()?,
                    destination: r.pubkey()?,
                })
            }
            GUARD_TOKEN_PAYMENT => {
                set.token_payment = Some(TokenPaymentGuard {
                    amount: r.u64()?,
                    mint: r.pubkey()?,
                    destination: r.pubkey()?,
                })
            }
            GUARD_START_DATE => set.start_date = Some(r.i64()?),
            GUARD_TOKEN_GATE => {
                set.token_gate = Some(TokenGateGuard {
                    amount: r.u64()?,
                    mint: r.pubkey()?,
                })
            }
            GUARD_END_DATE => set.end_date = Some(r.i64()?),
            _ => {
                r.skip(*size)?;
                set.other.push(*name);
            }
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&CANDY_GUARD_DISCRIMINATOR);
        data.extend_from_slice(&[9u8; 32]);
        data.push(255);
        data.extend_from_slice(&[8u8; 32]);
        data
    }

    fn label(s: &str) -> [u8; MAX_GROUP_LABEL_SIZE] {
        let mut out = [0u8; MAX_GROUP_LABEL_SIZE];
        out[..s.len()].copy_from_slice(s.as_bytes());
        out
    }

    #[test]
    fn test_decode_default_and_group() {
        let mut data = header();
        // default: botTax + solPayment
        data.extend_from_slice(&0b11u64.to_le_bytes());
        data.extend_from_slice(&10_000_000u64.to_le_bytes());
        data.push(1);
        data.extend_from_slice(&500_000_000u64.to_le_bytes());
        data.extend_from_slice(&[4u8; 32]);
        // one group: tokenPayment + tokenGate
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&label("GABU"));
        data.extend_from_slice(&((1u64 << 2) | (1u64 << 5)).to_le_bytes());
        data.extend_from_slice(&100u64.to_le_bytes());
        data.extend_from_slice(&[5u8; 32]);
        data.extend_from_slice(&[6u8; 32]);
        data.extend_from_slice(&5u64.to_le_bytes());
        data.extend_from_slice(&[7u8; 32]);

        let cg = decode_candy_guard(&data).unwrap();
        assert_eq!(cg.authority, Pubkey::new_from_array([8u8; 32]));
        assert_eq!(cg.guards.bot_tax.unwrap().lamports, 10_000_000);
        assert_eq!(cg.guards.sol_payment.unwrap().lamports, 500_000_000);
        let group = cg.group("GABU").unwrap();
        assert_eq!(group.guards.token_payment.unwrap().amount, 100);
        assert_eq!(group.guards.token_gate.unwrap().mint, Pubkey::new_from_array([7u8; 32]));
        assert!(cg.group("GAB").is_none());
    }

    #[test]
    fn test_skips_unmodeled_guards() {
        let mut data = header();
        // mintLimit (3 bytes) + solPayment
        data.extend_from_slice(&((1u64 << 9) | (1u64 << 1)).to_le_bytes());
        data.extend_from_slice(&1u64.to_le_bytes());
        data.extend_from_slice(&[4u8; 32]);
        data.extend_from_slice(&[1, 2, 0]);
        data.extend_from_slice(&0u32.to_le_bytes());

        let cg = decode_candy_guard(&data).unwrap();
        assert_eq!(cg.guards.sol_payment.unwrap().lamports, 1);
        assert_eq!(cg.guards.other, vec!["mintLimit"]);
        assert!(cg.groups.is_empty());
    }

    #[test]
    fn test_rejects_unknown_feature_bits() {
        let mut data = header();
        data.extend_from_slice(&(1u64 << 40).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        assert!(decode_candy_guard(&data).is_err());
    }

    #[test]
    fn test_group_overrides_default_on_merge() {
        let default = GuardSet {
            sol_payment: Some(SolPaymentGuard { lamports: 1, destination: Pubkey::default() }),
            bot_tax: Some(BotTax { lamports: 2, last_instruction: true }),
            other: vec!["allowList"],
            ..Default::default()
        };
        let group = GuardSet {
            sol_payment: Some(SolPaymentGuard { lamports: 3, destination: Pubkey::default() }),
            other: vec!["mintLimit", "allowList"],
            ..Default::default()
        };
        let merged = default.merged_with(&group);
        assert_eq!(merged.sol_payment.unwrap().lamports, 3);
        assert_eq!(merged.bot_tax.unwrap().lamports, 2);
        assert_eq!(merged.other, vec!["allowList", "mintLimit"]);
    }

    #[test]
    fn test_is_candy_guard() {
        assert!(is_candy_guard(&header()));
        assert!(!is_candy_guard(&[0u8; 40]));
        assert!(!is_candy_guard(&[]));
    }
}
