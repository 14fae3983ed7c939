/// Sentinel currency code for the pre-aggregated base-currency cash row.
///
/// The row is a cross-check total computed by the reporting service, not a
/// real currency holding.
pub const BASE_SUMMARY_CURRENCY: &str = "BASE_SUMMARY";

/// Level-of-detail tag identifying individual fills.
pub const EXECUTION_LEVEL_OF_DETAIL: &str = "EXECUTION";

/// Asset categories accepted into the trade ledger.
pub const TRADE_ASSET_CATEGORIES: [&str; 2] = ["STK", "ETF"];

/// Asset categories kept when caching open-position snapshots.
pub const SNAPSHOT_ASSET_CATEGORIES: [&str; 9] = [
    "STK", "ETF", "CFD", "OPT", "FUT", "WAR", "BOND", "FUND", "CASH",
];

/// Fallback reporting currency when the statement carries no account info.
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Snapshot age beyond which a background refresh is triggered.
pub const DEFAULT_SNAPSHOT_TTL_MINUTES: i64 = 15;

/// Hard timeout applied to each outbound Flex request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 12;

/// Absolute tolerance for the base-cash cross-check.
pub const CASH_CHECK_TOLERANCE: &str = "0.01";
