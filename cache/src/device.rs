//! Ephemeral half of the device binding guard.

use crate::error::StoreResult;
use crate::tokens::{DEVICE_PREFIX, TokenManager};

/// Outcome of comparing a presented fingerprint against the ephemeral binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCheck {
    /// No binding existed; the caller must bind the presented fingerprint.
    pub first_time: bool,
    /// The presented fingerprint equals the bound one (always `true` on first use).
    pub valid: bool,
}

impl TokenManager {
    fn device_key(student_id: i64) -> String {
        format!("{DEVICE_PREFIX}{student_id}")
    }

    pub async fn check_device(&self, student_id: i64, fingerprint: &str) -> StoreResult<DeviceCheck> {
        let bound = self.store().get(&Self::device_key(student_id)).await?;

        Ok(match bound {
            None => DeviceCheck {
                first_time: true,
                valid: true,
            },
            Some(bound) => DeviceCheck {
                first_time: false,
                valid: bound == fingerprint,
            },
        })
    }

    pub async fn bound_device(&self, student_id: i64) -> StoreResult<Option<String>> {
        self.store().get(&Self::device_key(student_id)).await
    }

    /// Binds without expiry. Rebinding only happens through admin reset or the
    /// durable fallback.
    pub async fn lock_device(&self, student_id: i64, fingerprint: &str) -> StoreResult<()> {
        self.store()
            .set(&Self::device_key(student_id), fingerprint, None)
            .await
    }

    pub async fn unlock_device(&self, student_id: i64) -> StoreResult<bool> {
        self.store().del(&Self::device_key(student_id)).await
    }
}
