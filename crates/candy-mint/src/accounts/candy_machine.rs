use solana_sdk::pubkey::Pubkey;

use super::{check_discriminator, decode_padded, ByteReader};
use crate::constants::{CANDY_MACHINE_DISCRIMINATOR, HIDDEN_SECTION, MAX_NAME_LENGTH, MAX_URI_LENGTH};
use crate::errors::{MintError, Result};

const CONTEXT: &str = "candy machine";

/// Config-line layout shared by every item of a machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigLineSettings {
    pub prefix_name: String,
    pub name_length: u32,
    pub prefix_uri: String,
    pub uri_length: u32,
    pub is_sequential: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HiddenSettings {
    pub name: String,
    pub uri: String,
    pub hash: [u8; 32],
}

/// One loaded item of the machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigLine {
    pub index: u32,
    pub name: String,
    pub uri: String,
}

/// Decoded Candy Machine Core account.
#[derive(Clone, Debug)]
pub struct CandyMachineAccount {
    pub version: u8,
    pub token_standard: u8,
    pub authority: Pubkey,
    pub mint_authority: Pubkey,
    pub collection_mint: Pubkey,
    pub items_redeemed: u64,
    pub items_available: u64,
    pub symbol: String,
    pub seller_fee_basis_points: u16,
    pub max_supply: u64,
    pub is_mutable: bool,
    pub config_line_settings: Option<ConfigLineSettings>,
    pub hidden_settings: Option<HiddenSettings>,
    /// Number of config lines written so far.
    pub items_loaded: u32,
    /// Loaded config lines in index order.
    pub items: Vec<ConfigLine>,
}

impl CandyMachineAccount {
    /// Items the sale counts against: loaded lines, or the full supply for
    /// hidden-settings machines which carry no lines.
    pub fn total_items(&self) -> u64 {
        if self.hidden_settings.is_some() {
            self.items_available
        } else {
            self.items_loaded as u64
        }
    }
}

/// Decode a Candy Machine account, including its config lines.
pub fn decode_candy_machine(data: &[u8]) -> Result<CandyMachineAccount> {
    check_discriminator(data, &CANDY_MACHINE_DISCRIMINATOR, CONTEXT)?;
    let mut r = ByteReader::at(data, 8, CONTEXT);

    let version = r.u8()?;
    let token_standard = r.u8()?;
    r.skip(6)?; // features
    let authority = r.pubkey()?;
    let mint_authority = r.pubkey()?;
    let collection_mint = r.pubkey()?;
    let items_redeemed = r.u64()?;

    let items_available = r.u64()?;
    let symbol = r.string()?;
    let seller_fee_basis_points = r.u16()?;
    let max_supply = r.u64()?;
    let is_mutable = r.bool()?;

    let creators = r.u32()? as usize;
    r.skip(creators * (32 + 1 + 1))?;

    let config_line_settings = if r.option_tag()? {
        Some(ConfigLineSettings {
            prefix_name: r.string()?,
            name_length: r.u32()?,
            prefix_uri: r.string()?,
            uri_length: r.u32()?,
            is_sequential: r.bool()?,
        })
    } else {
        None
    };

    let hidden_settings = if r.option_tag()? {
        let name = r.string()?;
        let uri = r.string()?;
        let hash: [u8; 32] = r
            .bytes(32)?
            .try_into()
            .map_err(|_| MintError::chain_read(CONTEXT, "bad hidden settings hash"))?;
        Some(HiddenSettings { name, uri, hash })
    } else {
        None
    };

    if r.position() > HIDDEN_SECTION {
        return Err(MintError::chain_read(CONTEXT, "candy machine data overruns hidden section"));
    }

    let (items_loaded, items) = if hidden_settings.is_none() {
        decode_config_lines(data, items_available, config_line_settings.as_ref())?
    } else {
        (0, Vec::new())
    };

    let account = CandyMachineAccount {
        version,
        token_standard,
        authority,
        mint_authority,
        collection_mint,
        items_redeemed,
        items_available,
        symbol,
        seller_fee_basis_points,
        max_supply,
        is_mutable,
        config_line_settings,
        hidden_settings,
        items_loaded,
        items,
    };

    if account.items_redeemed > account.total_items() {
        return Err(MintError::chain_read(
            CONTEXT,
            format!(
                "items_redeemed ({}) exceeds item count ({})",
                account.items_redeemed,
                account.total_items()
            ),
        ));
    }

    Ok(account)
}

/// Fixed width of one stored line and how its fields are laid out.
struct LineLayout<'a> {
    name_len: usize,
    uri_len: usize,
    /// Without settings each field is a Borsh string in a max-width slot.
    length_prefixed: bool,
    prefix_name: &'a str,
    prefix_uri: &'a str,
}

impl<'a> LineLayout<'a> {
    fn new(settings: Option<&'a ConfigLineSettings>) -> Self {
        match settings {
            Some(s) => Self {
                name_len: s.name_length as usize,
                uri_len: s.uri_length as usize,
                length_prefixed: false,
                prefix_name: &s.prefix_name,
                prefix_uri: &s.prefix_uri,
            },
            None => Self {
                name_len: MAX_NAME_LENGTH,
                uri_len: MAX_URI_LENGTH,
                length_prefixed: true,
                prefix_name: "",
                prefix_uri: "",
            },
        }
    }

    fn line_size(&self) -> usize {
        let prefix = if self.length_prefixed { 8 } else { 0 };
        prefix + self.name_len + self.uri_len
    }

    fn field(&self, line: &mut ByteReader<'_>, width: usize) -> Result<String> {
        if !self.length_prefixed {
            return decode_padded(line.bytes(width)?, CONTEXT);
        }
        let len = line.u32()? as usize;
        let slot = line.bytes(width)?;
        decode_padded(&slot[..len.min(width)], CONTEXT)
    }
}

fn decode_config_lines(
    data: &[u8],
    items_available: u64,
    settings: Option<&ConfigLineSettings>,
) -> Result<(u32, Vec<ConfigLine>)> {
    let mut r = ByteReader::at(data, HIDDEN_SECTION, CONTEXT);
    let items_loaded = r.u32()?;

    let layout = LineLayout::new(settings);
    let line_size = layout.line_size();
    let available = usize::try_from(items_available)
        .map_err(|_| MintError::chain_read(CONTEXT, "items_available out of range"))?;

    let lines_start = HIDDEN_SECTION + 4;
    let bitmask_start = available
        .checked_mul(line_size)
        .and_then(|len| len.checked_add(lines_start))
        .ok_or_else(|| MintError::chain_read(CONTEXT, "config line section out of range"))?;
    let bitmask_len = available / 8 + 1;
    let bitmask = ByteReader::at(data, bitmask_start, CONTEXT).bytes(bitmask_len)?;

    let mut items = Vec::with_capacity((items_loaded as usize).min(available));
    for index in 0..available {
        if bitmask[index / 8] & (0b1000_0000 >> (index % 8)) == 0 {
            continue;
        }
        // Cannot overflow: index * line_size < bitmask_start.
        let mut line = ByteReader::at(data, lines_start + index * line_size, CONTEXT);
        let raw_name = layout.field(&mut line, layout.name_len)?;
        let raw_uri = layout.field(&mut line, layout.uri_len)?;
        let index = index as u32;
        items.push(ConfigLine {
            index,
            name: expand_template(layout.prefix_name, &raw_name, index),
            uri: expand_template(layout.prefix_uri, &raw_uri, index),
        });
    }

    Ok((items_loaded, items))
}

/// Join a prefix with the stored text and substitute `$ID$` / `$ID+1$`.
fn expand_template(prefix: &str, value: &str, index: u32) -> String {
    format!("{}{}", prefix, value)
        .replace("$ID+1$", &(index + 1).to_string())
        .replace("$ID$", &index.to_string())
}
