//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `plab` exit codes.
//! Scripts driving the calculator rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                  |
//! |---------|------------|----------------------------------------------|
//! | 0       | Universal  | Success                                      |
//! | 1       | Universal  | General error (unspecified)                  |
//! | 2       | Universal  | Usage error (bad args, rejected edit)        |
//! | 3       | Universal  | File I/O error                               |
//! | 4       | Universal  | Malformed input (change-set, CSV, JSON)      |
//! | 20-29   | storage    | Worksheet store codes                        |
//! | 30-39   | transfer   | Price exchange between vendors               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Update the table above
//! 3. Wire it into the relevant command's error handling

use pricelab_io::StorageError;

// =============================================================================
// Universal (0-4)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown field, row out of range, rejected edit.
pub const EXIT_USAGE: u8 = 2;

/// Reading or writing a local file failed.
pub const EXIT_IO: u8 = 3;

/// Input could not be parsed.
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Storage (20-29)
// =============================================================================

/// Worksheet has never been written.
pub const EXIT_STORAGE_NOT_FOUND: u8 = 20;

/// Store could not be opened or refused the operation.
pub const EXIT_STORAGE_UNAVAILABLE: u8 = 21;

/// Stored data could not be read back.
pub const EXIT_STORAGE_CORRUPT: u8 = 22;

// =============================================================================
// Transfer (30-39)
// =============================================================================

/// Nothing has been sent to this vendor's inbox yet.
pub const EXIT_TRANSFER_EMPTY: u8 = 30;

/// Map a storage error to its exit code.
pub fn storage_exit_code(err: &StorageError) -> u8 {
    match err {
        StorageError::NotFound(_) => EXIT_STORAGE_NOT_FOUND,
        StorageError::Unavailable(_) => EXIT_STORAGE_UNAVAILABLE,
        StorageError::Corrupt(_) => EXIT_STORAGE_CORRUPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_PARSE,
            EXIT_STORAGE_NOT_FOUND,
            EXIT_STORAGE_UNAVAILABLE,
            EXIT_STORAGE_CORRUPT,
            EXIT_TRANSFER_EMPTY,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn test_storage_errors_map_into_range() {
        for err in [
            StorageError::NotFound("x".into()),
            StorageError::Unavailable("x".into()),
            StorageError::Corrupt("x".into()),
        ] {
            let code = storage_exit_code(&err);
            assert!((20..30).contains(&code), "{err} -> {code}");
        }
    }
}
