/// All logic related to a single account: its balance, kind and append-only
/// transaction log. State is modified using events, which are created by
/// validating a requested operation first.
pub mod account;

/// The ledger itself: owns every customer and account record and exposes
/// all mutation and query operations.
pub mod ledger;

/// Statement rendering for a single account.
pub mod statement;

/// Ideally, this module should exists on its own crate, as a way to
/// bootstrap core logic. However, I want to use it for integration test
/// so I put it here.
pub mod bin_utils;
