use solana_sdk::{pubkey, pubkey::Pubkey};

/// Metaplex Candy Machine Core (v3) program ID.
pub const CANDY_MACHINE_PROGRAM_ID: Pubkey =
    pubkey!("CndyV3LdqHUfDLmE5naZjVN8rBZz4tqhdefbAnjHG3JR");

/// Metaplex Candy Guard program ID.
pub const CANDY_GUARD_PROGRAM_ID: Pubkey =
    pubkey!("Guard1JwRhJkVH6XZhzoYxeBVQe872VH6QggF4BWmS9g");

/// Metaplex Token Metadata program ID.
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

// Well-known program and sysvar IDs
pub const SPL_TOKEN_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const ATA_PROGRAM_ID: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");
pub const SYSVAR_INSTRUCTIONS_ID: Pubkey =
    pubkey!("Sysvar1nstructions1111111111111111111111111");
pub const SYSVAR_SLOT_HASHES_ID: Pubkey =
    pubkey!("SysvarS1otHashes111111111111111111111111111");

// Account discriminators: sha256("account:<Name>")[..8]
pub const CANDY_MACHINE_DISCRIMINATOR: [u8; 8] = [51, 173, 177, 113, 25, 241, 109, 189];
pub const CANDY_GUARD_DISCRIMINATOR: [u8; 8] = [44, 207, 199, 184, 112, 103, 34, 181];

// Instruction discriminator: sha256("global:mint_v2")[..8]
pub const IX_MINT_V2: [u8; 8] = [120, 121, 23, 146, 173, 110, 199, 205];

// PDA seeds
pub const CANDY_MACHINE_AUTHORITY_SEED: &[u8] = b"candy_machine";
pub const METADATA_SEED: &[u8] = b"metadata";
pub const EDITION_SEED: &[u8] = b"edition";
pub const TOKEN_RECORD_SEED: &[u8] = b"token_record";
pub const COLLECTION_DELEGATE_SEED: &[u8] = b"collection_delegate";

// Candy Machine account layout
pub const MAX_SYMBOL_LENGTH: usize = 10;
pub const MAX_NAME_LENGTH: usize = 32;
pub const MAX_URI_LENGTH: usize = 200;
pub const MAX_CREATOR_LIMIT: usize = 5;
pub const MAX_CREATOR_LEN: usize = 32 + 1 + 1;

/// Start of the config-line section, after the largest possible `CandyMachineData`.
pub const HIDDEN_SECTION: usize = 8 // discriminator
    + 1 // version
    + 1 // token_standard
    + 6 // features
    + 32 // authority
    + 32 // mint_authority
    + 32 // collection_mint
    + 8 // items_redeemed
    + 8 // items_available
    + 4 + MAX_SYMBOL_LENGTH
    + 2 // seller_fee_basis_points
    + 8 // max_supply
    + 1 // is_mutable
    + 4 + MAX_CREATOR_LIMIT * MAX_CREATOR_LEN
    + 1 // config_line_settings option
    + 4 + MAX_NAME_LENGTH // prefix_name
    + 4 // name_length
    + 4 + MAX_URI_LENGTH // prefix_uri
    + 4 // uri_length
    + 1 // is_sequential
    + 1 // hidden_settings option
    + 4 + MAX_NAME_LENGTH // name
    + 4 + MAX_URI_LENGTH // uri
    + 32; // hash

// Candy Guard account layout
/// discriminator(8) + base(32) + bump(1) + authority(32)
pub const CANDY_GUARD_DATA_OFFSET: usize = 8 + 32 + 1 + 32;
pub const MAX_GROUP_LABEL_SIZE: usize = 6;

// SPL token account layout
pub const TOKEN_ACCOUNT_AMOUNT_OFFSET: usize = 64; // u64 LE

/// Compute units requested ahead of `mint_v2`.
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

/// Guard group the mint flow consumes unless configured otherwise.
pub const DEFAULT_GROUP_LABEL: &str = "GABU";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
