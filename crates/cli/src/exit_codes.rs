//! Exit codes for `shelfwise`.
//!
//! Every code the binary can return is declared here. Scripts branch on
//! them, so a code never changes meaning once released.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args, missing file) |
//! | 3-9     | input     | File, feed and config problems           |
//! | 10-19   | match     | Matching outcomes                        |
//! | 20-29   | sync      | Price reconciliation outcomes            |
//!
//! New codes go in the matching range and in the table above.

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-9)
// =============================================================================

/// Cannot read an input file or write an output file.
pub const EXIT_IO: u8 = 3;

/// Input is not decodable CSV.
pub const EXIT_PARSE: u8 = 4;

/// Config TOML failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// Column layout matches no known feed.
pub const EXIT_UNKNOWN_FEED: u8 = 6;

/// Feed was recognized, but is not the kind this command needs
/// (e.g. a sales feed passed as `--catalog`).
pub const EXIT_WRONG_FEED: u8 = 7;

// =============================================================================
// Match (10-19)
// =============================================================================

/// `check`: SKU not present in the catalog.
pub const EXIT_MATCH_UNKNOWN_SKU: u8 = 10;

/// `check`: no candidate reached the minimum score.
pub const EXIT_MATCH_NONE: u8 = 11;

// =============================================================================
// Sync (20-29)
// =============================================================================

/// Some signals or transitions failed; the rest were applied.
pub const EXIT_SYNC_PARTIAL: u8 = 20;
