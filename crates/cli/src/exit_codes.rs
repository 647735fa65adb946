//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; payroll scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                  |
//! |---------|------------|----------------------------------------------|
//! | 0       | Universal  | Success                                      |
//! | 1       | Universal  | General error (unspecified)                  |
//! | 2       | Universal  | CLI usage error (bad args, missing confirm)  |
//! | 3-9     | import     | Source file and row problems                 |
//! | 10-19   | data       | Snapshot, export and lookup codes            |
//! | 20-29   | config     | Column alias configuration                   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

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
// Import (3-9)
// =============================================================================

/// One or more files could not be read. Readable files were still merged and saved.
pub const EXIT_IMPORT_FILE_ERROR: u8 = 3;

/// `--strict` was given and at least one row was skipped as malformed.
pub const EXIT_IMPORT_ROWS_SKIPPED: u8 = 4;

// =============================================================================
// Data (10-19)
// =============================================================================

/// Saved dataset is unreadable or from an unsupported format version.
pub const EXIT_SNAPSHOT_READ: u8 = 10;

/// Dataset could not be saved. The previous snapshot is left in place.
pub const EXIT_SNAPSHOT_WRITE: u8 = 11;

/// Report export failed.
pub const EXIT_EXPORT_WRITE: u8 = 12;

/// `show` matched no employee.
pub const EXIT_NOT_FOUND: u8 = 13;

// =============================================================================
// Config (20-29)
// =============================================================================

/// Column alias file is missing, unparseable or fails validation.
pub const EXIT_COLUMN_CONFIG: u8 = 20;
