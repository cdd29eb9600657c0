use crate::constants::TOKEN_ACCOUNT_AMOUNT_OFFSET;

/// Read the `amount` field of an SPL token account.
/// Returns None if the data is too short to be a token account.
pub fn read_token_amount(data: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = data
        .get(TOKEN_ACCOUNT_AMOUNT_OFFSET..TOKEN_ACCOUNT_AMOUNT_OFFSET + 8)?
        .try_into()
        .ok()?;
    Some(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_token_amount() {
        let mut data = vec![0u8; 165];
        data[64..72].copy_from_slice(&42u64.to_le_bytes());
        assert_eq!(read_token_amount(&data), Some(42));
        assert_eq!(read_token_amount(&data[..70]), None);
    }
}
