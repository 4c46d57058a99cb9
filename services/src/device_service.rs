//! Device binding guard: one physical device per student account.
//!
//! The ephemeral `device:lock:{id}` key is checked first. The durable
//! `students.device_*` columns are the fallback when the two disagree, so a
//! flushed or restarted store never lets a student switch devices.

use cache::TokenManager;
use db::models::student::{self, DeviceDetails};
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

pub const FINGERPRINT_MIN_LEN: usize = 10;
pub const FINGERPRINT_MAX_LEN: usize = 100;
const BROWSER_MAX_LEN: usize = 100;

/// How a verified fingerprint relates to the account's binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOutcome {
    /// Matched the existing binding.
    Matched,
    /// First device for this account; now bound on both sides.
    Bound,
    /// Ephemeral key disagreed but nothing durable was recorded; rebound.
    Rebound,
}

/// Shape check only. The fingerprint is client-supplied and not authenticated.
pub fn validate_fingerprint(fingerprint: Option<&str>) -> AppResult<&str> {
    let fingerprint = fingerprint
        .map(str::trim)
        .filter(|fp| !fp.is_empty())
        .ok_or_else(|| AppError::Validation("Device fingerprint is required".into()))?;

    let len = fingerprint.chars().count();
    if !(FINGERPRINT_MIN_LEN..=FINGERPRINT_MAX_LEN).contains(&len) {
        return Err(AppError::Validation("Invalid device fingerprint".into()));
    }

    Ok(fingerprint)
}

/// Best-effort description of the client from its request headers.
pub fn parse_device_details(
    user_agent: Option<&str>,
    platform: Option<&str>,
    mobile: Option<&str>,
) -> DeviceDetails {
    let browser = user_agent
        .map(|ua| ua.chars().take(BROWSER_MAX_LEN).collect::<String>())
        .unwrap_or_else(|| "unknown".into());
    let os = platform
        .map(|p| p.trim_matches('"').to_owned())
        .unwrap_or_else(|| "unknown".into());
    let platform = if mobile == Some("?1") { "mobile" } else { "desktop" };

    DeviceDetails {
        browser: Some(browser),
        os: Some(os),
        platform: Some(platform.to_owned()),
    }
}

pub struct DeviceService;

impl DeviceService {
    /// Verifies `fingerprint` against the student's binding, binding it on first use.
    ///
    /// Store errors propagate: the guard fails closed.
    pub async fn verify(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        student: &student::Model,
        fingerprint: &str,
        details: DeviceDetails,
    ) -> AppResult<DeviceOutcome> {
        let check = tokens.check_device(student.id, fingerprint).await?;

        if check.valid && !check.first_time {
            return Ok(DeviceOutcome::Matched);
        }

        let durable = student::Entity::find_by_id(student.id)
            .one(db)
            .await?
            .and_then(|s| s.device_fingerprint);

        match durable {
            // ephemeral key missing or stale; the durable binding wins
            Some(bound) if bound != fingerprint => {
                if check.first_time {
                    tokens.lock_device(student.id, &bound).await?;
                }
                warn!(student_id = student.id, "Device fingerprint mismatch");
                Err(AppError::DeviceMismatch)
            }
            Some(_) => {
                tokens.lock_device(student.id, fingerprint).await?;
                Ok(DeviceOutcome::Matched)
            }
            None => {
                tokens.lock_device(student.id, fingerprint).await?;
                student::Model::bind_device(db, student.id, fingerprint, details).await?;

                if check.first_time {
                    info!(student_id = student.id, "Device bound");
                    Ok(DeviceOutcome::Bound)
                } else {
                    warn!(student_id = student.id, "Ephemeral device lock had no durable record; rebinding");
                    Ok(DeviceOutcome::Rebound)
                }
            }
        }
    }

    /// Clears the binding on both sides. Idempotent.
    pub async fn reset(db: &DatabaseConnection, tokens: &TokenManager, student_id: i64) -> AppResult<()> {
        student::Model::clear_device(db, student_id).await?;
        tokens.unlock_device(student_id).await?;
        info!(student_id, "Device binding reset");
        Ok(())
    }
}
