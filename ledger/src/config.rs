//! # Ledger Configuration & Constants
//!
//! Every limit the token contract enforces lives here. These values are part
//! of the ledger's observable behavior: changing one after records exist can
//! make old rows unreadable or old actions unrepeatable, so treat them as
//! frozen once a deployment holds real balances.

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Maximum length of an account or table name, in characters.
pub const MAX_NAME_LENGTH: usize = 12;

/// The character set names are drawn from, in encoding order. Index 0 (`.`)
/// is the padding value, so an all-zero name is the empty name.
pub const NAME_CHARSET: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Default identity of the token contract. The contract account is the only
/// identity allowed to create new symbols.
pub const DEFAULT_CONTRACT_ACCOUNT: &str = "tally.token";

// ---------------------------------------------------------------------------
// Symbols & Quantities
// ---------------------------------------------------------------------------

/// Maximum length of a symbol code. Seven ASCII letters fit in the low seven
/// bytes of a `u64`.
pub const MAX_SYMBOL_CODE_LENGTH: usize = 7;

/// Maximum decimal precision of a symbol.
pub const MAX_PRECISION: u8 = 18;

/// Largest representable asset amount magnitude: `2^62 - 1`.
///
/// Keeping two bits of headroom below `i64::MAX` means the sum of any two
/// valid amounts still fits in an `i64`, so range checks never overflow.
pub const MAX_ASSET_AMOUNT: i64 = (1_i64 << 62) - 1;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Maximum memo length in bytes for issue, retire, transfer, and burn.
pub const MAX_MEMO_BYTES: usize = 256;

/// Microseconds per second. Lock durations and time points are expressed in
/// microseconds; this is the conversion factor for human-facing surfaces.
pub const MICROS_PER_SECOND: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port of the node.
pub const DEFAULT_RPC_PORT: u16 = 8741;

/// Default Prometheus metrics port of the node.
pub const DEFAULT_METRICS_PORT: u16 = 8742;

/// Ledger version reported by the node.
pub const LEDGER_VERSION: &str = "0.1.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_is_sorted_and_unique() {
        // Packed names sort numerically in the same order as their text only
        // if the charset itself is in ascending byte order.
        assert!(NAME_CHARSET.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(NAME_CHARSET[0], b'.');
    }

    #[test]
    fn amount_headroom_allows_unchecked_pair_sum() {
        assert!(MAX_ASSET_AMOUNT.checked_add(MAX_ASSET_AMOUNT).is_some());
        assert!((-MAX_ASSET_AMOUNT).checked_sub(MAX_ASSET_AMOUNT).is_some());
    }

    #[test]
    fn default_contract_account_fits_name_rules() {
        assert!(DEFAULT_CONTRACT_ACCOUNT.len() <= MAX_NAME_LENGTH);
        assert!(DEFAULT_CONTRACT_ACCOUNT
            .bytes()
            .all(|b| NAME_CHARSET.contains(&b)));
    }

    #[test]
    fn ports_are_distinct() {
        assert_ne!(DEFAULT_RPC_PORT, DEFAULT_METRICS_PORT);
    }
}
