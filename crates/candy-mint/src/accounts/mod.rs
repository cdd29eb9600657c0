//! Decoders for the raw accounts the mint flow reads.
//!
//! Everything here is a pure function over account bytes: no RPC, no I/O.
//! The external programs own these layouts; offsets mirror their Borsh
//! encodings.

pub mod candy_guard;
pub mod candy_machine;
pub mod metadata;
pub mod token;

use solana_sdk::pubkey::Pubkey;

use crate::errors::{MintError, Result};

/// Forward-only reader over Borsh-encoded account data.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], context: &'static str) -> Self {
        Self { data, pos: 0, context }
    }

    pub fn at(data: &'a [u8], pos: usize, context: &'static str) -> Self {
        Self { data, pos, context }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn truncated(&self, wanted: usize) -> MintError {
        MintError::chain_read(
            self.context,
            format!(
                "account data truncated: need {} bytes at offset {}, have {}",
                wanted,
                self.pos,
                self.data.len()
            ),
        )
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.truncated(len))?;
        if end > self.data.len() {
            return Err(self.truncated(len));
        }
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn bool(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(MintError::chain_read(self.context, format!("invalid bool byte {}", v))),
        }
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b: [u8; 4] = self.bytes(4)?.try_into().map_err(|_| self.truncated(4))?;
        Ok(u32::from_le_bytes(b))
    }

    pub fn u64(&mut self) -> Result<u64> {
        let b: [u8; 8] = self.bytes(8)?.try_into().map_err(|_| self.truncated(8))?;
        Ok(u64::from_le_bytes(b))
    }

    pub fn i64(&mut self) -> Result<i64> {
        Ok(self.u64()? as i64)
    }

    pub fn pubkey(&mut self) -> Result<Pubkey> {
        let b: [u8; 32] = self.bytes(32)?.try_into().map_err(|_| self.truncated(32))?;
        Ok(Pubkey::new_from_array(b))
    }

    /// Borsh `String`: u32 LE length + UTF-8 bytes. Trailing NUL padding is stripped.
    pub fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let raw = self.bytes(len)?;
        decode_padded(raw, self.context)
    }

    /// Borsh `Option` tag.
    pub fn option_tag(&mut self) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(MintError::chain_read(self.context, format!("invalid option tag {}", v))),
        }
    }
}

/// Decode a fixed-width, NUL-padded UTF-8 field.
pub(crate) fn decode_padded(raw: &[u8], context: &'static str) -> Result<String> {
    let end = raw.iter().rposition(|b| *b != 0).map(|i| i + 1).unwrap_or(0);
    String::from_utf8(raw[..end].to_vec())
        .map_err(|_| MintError::chain_read(context, "invalid UTF-8 in string field"))
}

/// Check the 8-byte Anchor discriminator at the start of `data`.
pub(crate) fn check_discriminator(data: &[u8], expected: &[u8; 8], context: &'static str) -> Result<()> {
    if data.len() < 8 {
        return Err(MintError::chain_read(context, "account data shorter than discriminator"));
    }
    if data[..8] != expected[..] {
        return Err(MintError::chain_read(context, "unexpected account discriminator"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_string_strips_padding() {
        let mut data = Vec::new();
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(b"Bubu\0\0");
        let mut r = ByteReader::new(&data, "test");
        assert_eq!(r.string().unwrap(), "Bubu");
        assert_eq!(r.position(), 10);
    }

    #[test]
    fn test_reader_truncated() {
        let data = [1u8, 2, 3];
        let mut r = ByteReader::new(&data, "test");
        assert!(matches!(r.u64(), Err(MintError::ChainRead { .. })));
    }

    #[test]
    fn test_reader_invalid_bool() {
        let data = [2u8];
        let mut r = ByteReader::new(&data, "test");
        assert!(r.bool().is_err());
    }

    #[test]
    fn test_discriminator_mismatch() {
        let data = [0u8; 16];
        assert!(check_discriminator(&data, &[1; 8], "test").is_err());
        assert!(check_discriminator(&data, &[0; 8], "test").is_ok());
        assert!(check_discriminator(&data[..4], &[0; 8], "test").is_err());
    }
}
