use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitgen_core::constants::{DEFAULT_TIME_FORMAT, MAX_SLOT_DURATION_SECS, MIN_SLOT_DURATION_SECS};
use vitgen_core::error::VitgenError;
use vitgen_core::types::{ChainTime, Timestamp};

/// Converts between wall-clock instants and ledger `(epoch, slot)` time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainClock {
    genesis: Timestamp,
    slot_duration: u8,
    slots_per_epoch: u32,
}

impl ChainClock {
    /// Build a clock from wall-clock durations.
    ///
    /// The slot duration must be whole seconds within 1s..=255s and the epoch
    /// duration a non-zero whole multiple of it.
    pub fn new(
        genesis: Timestamp,
        slot_duration: Duration,
        epoch_duration: Duration,
    ) -> Result<Self, VitgenError> {
        let slot_secs = slot_duration.as_secs();
        if slot_duration.subsec_nanos() != 0
            || !(MIN_SLOT_DURATION_SECS..=MAX_SLOT_DURATION_SECS).contains(&slot_secs)
        {
            return Err(VitgenError::InvalidSlotDuration { secs: slot_secs });
        }

        let epoch_secs = epoch_duration.as_secs();
        if epoch_duration.subsec_nanos() != 0 || epoch_secs == 0 || epoch_secs % slot_secs != 0 {
            return Err(VitgenError::InvalidEpochDuration {
                epoch_secs,
                slot_secs,
            });
        }

        let slots_per_epoch = u32::try_from(epoch_secs / slot_secs).map_err(|_| {
            VitgenError::Config(format!("epoch duration {epoch_secs}s has too many slots"))
        })?;

        Ok(Self {
            genesis,
            slot_duration: slot_secs as u8,
            slots_per_epoch,
        })
    }

    pub fn genesis(&self) -> Timestamp {
        self.genesis
    }

    pub fn slot_duration(&self) -> u8 {
        self.slot_duration
    }

    pub fn slots_per_epoch(&self) -> u32 {
        self.slots_per_epoch
    }

    pub fn epoch_duration_secs(&self) -> u64 {
        self.slot_duration as u64 * self.slots_per_epoch as u64
    }

    /// Chain time of `instant`. Instants between slot boundaries round down.
    pub fn to_chain_time(&self, instant: Timestamp) -> Result<ChainTime, VitgenError> {
        if instant < self.genesis {
            return Err(VitgenError::Config(format!(
                "instant {instant} is before genesis {}",
                self.genesis
            )));
        }
        let slots = (instant - self.genesis) as u64 / self.slot_duration as u64;
        let epoch = u32::try_from(slots / self.slots_per_epoch as u64).map_err(|_| {
            VitgenError::Config(format!("instant {instant} is beyond the last representable epoch"))
        })?;
        let slot_id = (slots % self.slots_per_epoch as u64) as u32;
        Ok(ChainTime { epoch, slot_id })
    }

    /// Wall-clock instant at the start of `time`.
    pub fn to_instant(&self, time: ChainTime) -> Timestamp {
        let slots = time.epoch as i64 * self.slots_per_epoch as i64 + time.slot_id as i64;
        self.genesis + slots * self.slot_duration as i64
    }

    /// Whether `instant` lies on the slot grid anchored at genesis.
    pub fn is_aligned(&self, instant: Timestamp) -> bool {
        (instant - self.genesis).rem_euclid(self.slot_duration as i64) == 0
    }

    pub fn require_aligned(&self, boundary: &'static str, instant: Timestamp) -> Result<(), VitgenError> {
        if self.is_aligned(instant) {
            return Ok(());
        }
        Err(VitgenError::MisalignedBoundary {
            boundary,
            instant,
            step_secs: self.slot_duration as u64,
            genesis: self.genesis,
        })
    }
}

// ── TimeFormat ───────────────────────────────────────────────────────────────

/// Validated strftime pattern used to render plan windows for humans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeFormat(String);

impl TimeFormat {
    pub fn new(pattern: impl Into<String>) -> Result<Self, VitgenError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Ok(Self::default());
        }
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(VitgenError::Config(format!("invalid time format [{pattern}]")));
        }
        Ok(Self(pattern))
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    /// Render `instant` in UTC.
    pub fn format(&self, instant: Timestamp) -> String {
        match DateTime::<Utc>::from_timestamp(instant, 0) {
            Some(dt) => dt.format(&self.0).to_string(),
            None => instant.to_string(),
        }
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self(DEFAULT_TIME_FORMAT.to_string())
    }
}
