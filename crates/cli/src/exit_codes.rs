//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success; every row matched, nothing unprocessable        |
//! | 1    | General error (unspecified)                              |
//! | 2    | CLI usage error (bad args; emitted by clap)              |
//! | 3    | Discrepancies found                                      |
//! | 4    | Invalid config (parse, validation, unknown schema)       |
//! | 5    | Runtime error (unreadable input, output write failure)   |
//! | 6    | Unprocessable records, but no discrepancies              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
/// clap exits with this itself; listed here so the table stays complete.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Recon found at least one row that isn't `matched`.
pub const EXIT_RECON_MISMATCH: u8 = 3;

/// Config could not be parsed or failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 4;

/// Input files unreadable or unparseable, or outputs could not be written.
pub const EXIT_RECON_RUNTIME: u8 = 5;

/// Every paired row matched, but some records were unprocessable.
pub const EXIT_RECON_UNPROCESSABLE: u8 = 6;
