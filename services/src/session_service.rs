//! Session lifecycle: create, end, regenerate QR, and the teacher dashboards.
//!
//! The durable row is always written first and the ephemeral cache entry is a
//! derived copy whose TTL never exceeds the row's remaining validity.

use std::time::Duration;

use cache::{SessionSnapshot, TokenManager};
use chrono::{DateTime, Utc};
use db::models::{
    attendance_record,
    attendance_session::{self, NewSession},
    student, teacher,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::qr;

pub const MIN_EXPIRY_MINUTES: i64 = 1;
pub const MAX_EXPIRY_MINUTES: i64 = 1440;
pub const RECENT_SESSIONS_LIMIT: u64 = 50;

#[derive(Debug, Clone, Default)]
pub struct CreateSession {
    pub subject: String,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub section: Option<String>,
    pub expiry_minutes: Option<i64>,
}

/// JSON document embedded in the QR code. Only `sessionCode` is read back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub session_code: String,
    pub subject: String,
    pub teacher: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedSession {
    pub session: attendance_session::Model,
    pub qr_svg: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedQr {
    pub qr_svg: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: attendance_session::Model,
    pub attendance_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub id: i64,
    pub name: String,
    pub roll_number: String,
    pub email: String,
    pub department: String,
    pub year: i32,
    pub section: Option<String>,
}

impl From<student::Model> for StudentSummary {
    fn from(s: student::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            roll_number: s.roll_number,
            email: s.email,
            department: s.department,
            year: s.year,
            section: s.section,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceEntry {
    #[serde(flatten)]
    pub record: attendance_record::Model,
    pub student: Option<StudentSummary>,
}

pub fn snapshot(session: &attendance_session::Model) -> SessionSnapshot {
    SessionSnapshot {
        id: session.id,
        teacher_id: session.teacher_id,
        code: session.code.clone(),
        subject: session.subject.clone(),
        department: session.department.clone(),
        year: session.year,
        section: session.section.clone(),
        active: session.active,
        expires_at: session.expires_at,
    }
}

/// Whole seconds until `expires_at`, rounded down so a cache entry never
/// outlives the row; `None` once less than a second remains.
pub fn remaining_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    let secs = (expires_at - now).num_seconds();
    (secs > 0).then(|| Duration::from_secs(secs as u64))
}

pub struct SessionService;

impl SessionService {
    pub async fn create(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        teacher: &teacher::Model,
        req: CreateSession,
        default_minutes: i64,
        now: DateTime<Utc>,
    ) -> AppResult<CreatedSession> {
        let subject = req.subject.trim();
        if subject.is_empty() {
            return Err(AppError::Validation("Subject is required".into()));
        }

        let minutes = req.expiry_minutes.unwrap_or(default_minutes);
        if !(MIN_EXPIRY_MINUTES..=MAX_EXPIRY_MINUTES).contains(&minutes) {
            return Err(AppError::Validation(format!(
                "expiry_minutes must be between {MIN_EXPIRY_MINUTES} and {MAX_EXPIRY_MINUTES}"
            )));
        }

        let code = Uuid::new_v4().to_string();
        let expires_at = now + chrono::Duration::minutes(minutes);
        let department = req
            .department
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| teacher.department.clone());

        let payload = QrPayload {
            session_code: code.clone(),
            subject: subject.to_owned(),
            teacher: teacher.name.clone(),
            department: department.clone(),
            created_at: now,
            expires_at,
        };
        let qr_payload = serde_json::to_string(&payload)
            .map_err(|e| AppError::Qr(e.to_string()))?;
        let qr_svg = qr::render_svg(&qr_payload)?;

        let session = attendance_session::Model::create(
            db,
            NewSession {
                code,
                teacher_id: teacher.id,
                subject: subject.to_owned(),
                department,
                year: req.year,
                section: req.section,
                qr_payload,
                expires_at,
            },
        )
        .await?;

        // measured after the insert, not from the caller's `now`
        if let Some(ttl) = remaining_ttl(expires_at, Utc::now()) {
            if let Err(e) = tokens.cache_session(&snapshot(&session), ttl).await {
                warn!(session_code = %session.code, error = %e, "Failed to cache session; lookups will use the database");
            }
        }

        info!(
            session_id = session.id,
            teacher_id = teacher.id,
            minutes,
            "Attendance session created"
        );

        Ok(CreatedSession { session, qr_svg })
    }

    /// Deactivates the durable row, then drops the cache entry.
    ///
    /// `teacher_id = None` is the unscoped admin force-end.
    pub async fn end(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        session_id: i64,
        teacher_id: Option<i64>,
    ) -> AppResult<attendance_session::Model> {
        let session = match teacher_id {
            Some(teacher_id) => attendance_session::Model::find_owned(db, session_id, teacher_id).await?,
            None => attendance_session::Entity::find_by_id(session_id).one(db).await?,
        }
        .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        let ended = attendance_session::Model::deactivate(db, session.id).await?;
        // a leftover cache entry is harmless: marking re-validates the durable row
        if let Err(e) = tokens.invalidate_session(&ended.code).await {
            warn!(session_id, error = %e, "Failed to invalidate cached session");
        }

        info!(session_id, forced = teacher_id.is_none(), "Attendance session ended");
        Ok(ended)
    }

    /// Re-renders the stored payload. Never issues a new code or extends expiry.
    pub async fn regenerate_qr(
        db: &DatabaseConnection,
        session_id: i64,
        teacher_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<RenderedQr> {
        let session = attendance_session::Model::find_owned(db, session_id, teacher_id)
            .await?
            .filter(|s| s.is_live(now))
            .ok_or_else(|| AppError::NotFound("Active session not found".into()))?;

        Ok(RenderedQr {
            qr_svg: qr::render_svg(&session.qr_payload)?,
            expires_at: session.expires_at,
        })
    }

    /// Live sessions with the advisory counter.
    pub async fn active_sessions(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        teacher_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<SessionSummary>> {
        let sessions = attendance_session::Model::active_for_teacher(db, teacher_id, now).await?;

        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions {
            let attendance_count = tokens.attendance_count(session.id).await;
            out.push(SessionSummary {
                session,
                attendance_count,
            });
        }
        Ok(out)
    }

    /// Last fifty sessions with durable counts.
    pub async fn recent_sessions(
        db: &DatabaseConnection,
        teacher_id: i64,
    ) -> AppResult<Vec<SessionSummary>> {
        let sessions =
            attendance_session::Model::recent_for_teacher(db, teacher_id, RECENT_SESSIONS_LIMIT).await?;

        let mut out = Vec::with_capacity(sessions.len());
        for session in sessions {
            let attendance_count =
                attendance_record::Model::count_for_session(db, session.id).await? as i64;
            out.push(SessionSummary {
                session,
                attendance_count,
            });
        }
        Ok(out)
    }

    pub async fn session_attendance(
        db: &DatabaseConnection,
        session_id: i64,
        teacher_id: i64,
    ) -> AppResult<Vec<AttendanceEntry>> {
        attendance_session::Model::find_owned(db, session_id, teacher_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        let rows = attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .order_by_asc(attendance_record::Column::MarkedAt)
            .find_also_related(student::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(record, student)| AttendanceEntry {
                record,
                student: student.map(StudentSummary::from),
            })
            .collect())
    }
}
