use solana_sdk::pubkey::Pubkey;

use super::ByteReader;
use crate::constants::{
    EDITION_SEED, METADATA_SEED, TOKEN_METADATA_PROGRAM_ID, TOKEN_RECORD_SEED,
    COLLECTION_DELEGATE_SEED,
};
use crate::errors::{MintError, Result};

const CONTEXT: &str = "token metadata";

/// `Key::MetadataV1` tag at the start of a Metadata account.
const METADATA_V1_KEY: u8 = 4;

/// The fields of a Token Metadata `Metadata` account the mint flow needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataAccount {
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// Layout: key(1) + update_authority(32) + mint(32) + name + symbol + uri (Borsh strings, NUL padded).
pub fn decode_metadata(data: &[u8]) -> Result<MetadataAccount> {
    let mut r = ByteReader::new(data, CONTEXT);
    let key = r.u8()?;
    if key != METADATA_V1_KEY {
        return Err(MintError::chain_read(CONTEXT, format!("unexpected metadata key {}", key)));
    }
    Ok(MetadataAccount {
        update_authority: r.pubkey()?,
        mint: r.pubkey()?,
        name: r.string()?,
        symbol: r.string()?,
        uri: r.string()?,
    })
}

pub fn metadata_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[METADATA_SEED, TOKEN_METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

pub fn master_edition_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[METADATA_SEED, TOKEN_METADATA_PROGRAM_ID.as_ref(), mint.as_ref(), EDITION_SEED],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

pub fn token_record_pda(mint: &Pubkey, token: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            TOKEN_RECORD_SEED,
            token.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

/// Collection delegate record granting `delegate` authority over the collection.
pub fn collection_delegate_record_pda(
    collection_mint: &Pubkey,
    update_authority: &Pubkey,
    delegate: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            collection_mint.as_ref(),
            COLLECTION_DELEGATE_SEED,
            update_authority.as_ref(),
            delegate.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}
