/// ─── vitgen Constants ───────────────────────────────────────────────────────
///
/// Limits and defaults shared by the compiler, the gateway and the exports.

// ── Chain time ───────────────────────────────────────────────────────────────

/// Smallest slot duration accepted by the ledger, in seconds.
pub const MIN_SLOT_DURATION_SECS: u64 = 1;

/// Largest slot duration accepted by the ledger, in seconds (stored as u8).
pub const MAX_SLOT_DURATION_SECS: u64 = 255;

// ── Vote plans ───────────────────────────────────────────────────────────────

/// Smallest accepted number of proposals per vote plan.
pub const MIN_PLAN_SIZE: usize = 1;

/// Largest accepted number of proposals per vote plan. In-plan indices are
/// stored as u8, so 256 members use indices 0..=255.
pub const MAX_PLAN_SIZE: usize = 256;

/// Default cap on proposals per vote plan.
pub const DEFAULT_PLAN_SIZE: usize = 255;

/// Number of tally option columns the servicing station historically exposed.
/// Option sets larger than this are still exported, but flagged in the logs.
pub const LEGACY_TALLY_OPTION_COLUMNS: usize = 16;

// ── Money ────────────────────────────────────────────────────────────────────

/// Lovelace per ADA. Input rows carry whole ADA.
pub const LOVELACE_PER_ADA: u64 = 1_000_000;

/// Default funding for each BFT leader account in genesis (Lovelace).
pub const DEFAULT_LEADER_FUND: u64 = 1_000_000;

/// Default funding for each committee member account in genesis (Lovelace).
pub const DEFAULT_COMMITTEE_FUND: u64 = 1_000_000;

// ── Display ──────────────────────────────────────────────────────────────────

/// strftime pattern used for human-readable plan windows (RFC 3339, UTC).
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Epochs after committee end at which rewards information is published.
pub const REWARDS_INFO_EPOCHS: u32 = 7;

/// Epochs after committee end at which the next fund is announced.
pub const NEXT_FUND_EPOCHS: u32 = 15;

// ── Gateway ──────────────────────────────────────────────────────────────────

/// Path prefix shared by every gateway route.
pub const API_PREFIX: &str = "/api/v0";

/// Node REST resources the gateway forwards verbatim.
pub const PROXIED_RESOURCES: [&str; 5] = ["account", "block", "fragment", "message", "settings"];
