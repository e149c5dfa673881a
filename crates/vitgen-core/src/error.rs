use thiserror::Error;

/// Coarse classification of a [`VitgenError`].
///
/// Every compiler failure is fatal to the run; the category only decides how
/// it is reported (and, at the gateway, which status code is returned).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    DataIntegrity,
    ExternalTool,
    NotFound,
    Io,
}

#[derive(Debug, Error)]
pub enum VitgenError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("slot duration must be within 1s..=255s, got {secs}s")]
    InvalidSlotDuration { secs: u64 },

    #[error("epoch duration {epoch_secs}s must be a non-zero multiple of slot duration {slot_secs}s")]
    InvalidEpochDuration { epoch_secs: u64, slot_secs: u64 },

    #[error("{name} duration {secs}s must be a non-zero multiple of slot duration {slot_secs}s")]
    InvalidWindowDuration {
        name: &'static str,
        secs: u64,
        slot_secs: u64,
    },

    #[error("{boundary} ({instant}) is before {earlier} ({earlier_instant})")]
    BoundaryOrder {
        boundary: &'static str,
        instant: i64,
        earlier: &'static str,
        earlier_instant: i64,
    },

    #[error("{boundary} ({instant}) needs {step_secs}s steps from genesis ({genesis})")]
    MisalignedBoundary {
        boundary: &'static str,
        instant: i64,
        step_secs: u64,
        genesis: i64,
    },

    #[error("max plan size must be within 1..=256, got {0}")]
    InvalidPlanSize(usize),

    #[error("block0 vote plan embedding is enabled but no leader secret key is available to sign")]
    MissingSigner,

    #[error("configuration error: {0}")]
    Config(String),

    // ── Data integrity errors ────────────────────────────────────────────────
    #[error("external id {external_id} shared by proposals {first} and {second}")]
    DuplicateExternalId {
        external_id: String,
        first: u64,
        second: u64,
    },

    #[error("proposal {internal_id} already carries external id {existing}")]
    ExternalIdReassigned { internal_id: u64, existing: String },

    #[error("private vote plan #{plan_index} has no committee member keys")]
    MissingCommitteeKeys { plan_index: usize },

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    // ── External tool-chain errors ───────────────────────────────────────────
    #[error("external tool `{tool}` failed: {stderr}")]
    ExternalTool { tool: String, stderr: String },

    // ── Lookup errors ────────────────────────────────────────────────────────
    #[error("not found: {0}")]
    NotFound(String),

    // ── Plumbing ─────────────────────────────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl VitgenError {
    pub fn category(&self) -> ErrorCategory {
        use VitgenError::*;
        match self {
            InvalidSlotDuration { .. }
            | InvalidEpochDuration { .. }
            | InvalidWindowDuration { .. }
            | BoundaryOrder { .. }
            | MisalignedBoundary { .. }
            | InvalidPlanSize(_)
            | MissingSigner
            | Config(_) => ErrorCategory::Config,
            DuplicateExternalId { .. }
            | ExternalIdReassigned { .. }
            | MissingCommitteeKeys { .. }
            | DataIntegrity(_)
            | Serialization(_) => ErrorCategory::DataIntegrity,
            ExternalTool { .. } => ErrorCategory::ExternalTool,
            NotFound(_) => ErrorCategory::NotFound,
            Io(_) => ErrorCategory::Io,
        }
    }

    pub fn external_tool(tool: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            stderr: stderr.into(),
        }
    }
}

impl From<serde_json::Error> for VitgenError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
