//! The attendance marking pipeline.
//!
//! A scan passes, in order: dedup marker, per-student scan lock, cooldown,
//! device binding, session resolution, one durable transaction, and finally the
//! ephemeral bookkeeping. The first failing step short-circuits. The scan lock
//! is released on every path once acquired.
//!
//! Ephemeral writes happen only after the durable commit. A crash between the
//! commit and the cooldown write leaves a recorded mark without a cooldown;
//! the next scan of the same session still hits the unique index.

use std::collections::HashMap;

use cache::TokenManager;
use chrono::{DateTime, Utc};
use db::models::{
    attendance_record::{self, AttendanceStatus, NewAttendance, is_unique_violation},
    attendance_session,
    student::{self, DeviceDetails},
    teacher, token_history,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::device_service::{DeviceService, validate_fingerprint};
use crate::error::{AppError, AppResult};

/// One scan, as presented by an authenticated student.
#[derive(Debug, Clone)]
pub struct MarkRequest<'a> {
    pub student: &'a student::Model,
    pub session_code: &'a str,
    pub fingerprint: Option<&'a str>,
    pub device: DeviceDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkOutcome {
    pub attendance_id: i64,
    pub subject: String,
    pub marked_at: DateTime<Utc>,
    pub status: AttendanceStatus,
    /// Advisory; may lag the durable count under partial failure.
    pub total_attendance_in_session: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub subject: String,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
    pub session_code: Option<String>,
    pub department: Option<String>,
    pub teacher_name: Option<String>,
}

pub struct AttendanceService;

impl AttendanceService {
    pub async fn mark(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        req: MarkRequest<'_>,
        now: DateTime<Utc>,
    ) -> AppResult<MarkOutcome> {
        let session_code = req.session_code.trim();
        if session_code.is_empty() {
            return Err(AppError::Validation("Session code is required".into()));
        }
        let fingerprint = validate_fingerprint(req.fingerprint)?;
        let student_id = req.student.id;

        if tokens.is_duplicate_request(student_id, session_code).await {
            debug!(student_id, session_code, "Duplicate scan suppressed");
            return Err(AppError::DuplicateRequest);
        }

        let lock = tokens
            .lock_scan(student_id)
            .await?
            .ok_or(AppError::ScanInProgress)?;

        let result = Self::mark_locked(db, tokens, &req, session_code, fingerprint, now).await;

        lock.release().await;
        result
    }

    async fn mark_locked(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        req: &MarkRequest<'_>,
        session_code: &str,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> AppResult<MarkOutcome> {
        let student = req.student;

        if !tokens.try_has_available_token(student.id).await? {
            let remaining_seconds = tokens.cooldown_remaining(student.id).await.max(1);
            return Err(AppError::CooldownActive { remaining_seconds });
        }

        DeviceService::verify(db, tokens, student, fingerprint, req.device.clone()).await?;

        let session = Self::resolve_session(db, tokens, session_code, now).await?;

        let record = Self::record_attendance(db, &session, student.id, Some(fingerprint), now).await?;

        let total = Self::commit_ephemeral(db, tokens, &session, student.id, fingerprint).await;

        info!(
            student_id = student.id,
            session_id = session.id,
            attendance_id = record.id,
            "Attendance marked"
        );

        Ok(MarkOutcome {
            attendance_id: record.id,
            subject: record.subject,
            marked_at: record.marked_at,
            status: record.status,
            total_attendance_in_session: total,
        })
    }

    /// Cache first, re-validated against its own fields and then against the
    /// durable row. A failing cache read degrades to the durable lookup.
    pub async fn resolve_session(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        session_code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<attendance_session::Model> {
        let cached = match tokens.cached_session(session_code).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(session_code, error = %e, "Session cache unavailable; using database");
                None
            }
        };

        let Some(snapshot) = cached else {
            return attendance_session::Model::find_live_by_code(db, session_code, now)
                .await?
                .ok_or(AppError::SessionNotFound);
        };

        if !snapshot.is_live(now) {
            return Err(AppError::SessionExpired);
        }

        let session = attendance_session::Entity::find_by_id(snapshot.id)
            .one(db)
            .await?
            .ok_or(AppError::SessionNotFound)?;

        if !session.is_live(now) {
            return Err(AppError::SessionExpired);
        }
        Ok(session)
    }

    /// The durable critical section: re-check, insert, bump `scan_count`.
    pub async fn record_attendance(
        db: &DatabaseConnection,
        session: &attendance_session::Model,
        student_id: i64,
        fingerprint: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<attendance_record::Model> {
        let txn = db.begin().await?;

        let existing =
            attendance_record::Model::find_for_student_in_session(&txn, session.id, student_id).await?;
        if existing.is_some() {
            txn.rollback().await?;
            return Err(AppError::AlreadyMarked);
        }

        let record = attendance_record::Model::create(
            &txn,
            NewAttendance {
                session_id: session.id,
                student_id,
                teacher_id: session.teacher_id,
                subject: session.subject.clone(),
                status: AttendanceStatus::Present,
                marked_at: now,
                device_fingerprint: fingerprint.map(str::to_owned),
            },
        )
        .await
        .map_err(already_marked_or)?;

        attendance_session::Model::increment_scan_count(&txn, session.id).await?;
        txn.commit().await.map_err(already_marked_or)?;

        Ok(record)
    }

    /// Post-commit bookkeeping. Failures here are logged and never undo the mark.
    async fn commit_ephemeral(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        session: &attendance_session::Model,
        student_id: i64,
        fingerprint: &str,
    ) -> i64 {
        if let Err(e) = tokens.consume_token(student_id, session.id, fingerprint).await {
            error!(student_id, session_id = session.id, error = %e, "Cooldown not recorded after committed mark");
        }

        let cooldown = chrono::Duration::from_std(tokens.settings().cooldown)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        if let Err(e) = token_history::Model::record(
            db,
            student_id,
            session.id,
            Some(fingerprint.to_owned()),
            cooldown,
        )
        .await
        {
            error!(student_id, session_id = session.id, error = %e, "Failed to append token history");
        }

        match tokens.increment_attendance_count(session.id).await {
            Ok(total) => total,
            Err(e) => {
                warn!(session_id = session.id, error = %e, "Live counter unavailable; using durable count");
                attendance_session::Entity::find_by_id(session.id)
                    .one(db)
                    .await
                    .ok()
                    .flatten()
                    .map(|s| s.scan_count)
                    .unwrap_or(session.scan_count + 1)
            }
        }
    }

    /// The student's own marks, newest first.
    pub async fn my_attendance(db: &DatabaseConnection, student_id: i64) -> AppResult<Vec<HistoryEntry>> {
        let rows = attendance_record::Entity::find()
            .filter(attendance_record::Column::StudentId.eq(student_id))
            .order_by_desc(attendance_record::Column::MarkedAt)
            .find_also_related(attendance_session::Entity)
            .all(db)
            .await?;

        let teacher_ids: Vec<i64> = rows.iter().map(|(r, _)| r.teacher_id).collect();
        let teachers: HashMap<i64, String> = teacher::Entity::find()
            .filter(teacher::Column::Id.is_in(teacher_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        Ok(rows
            .into_iter()
            .map(|(record, session)| HistoryEntry {
                id: record.id,
                teacher_name: teachers.get(&record.teacher_id).cloned(),
                subject: record.subject,
                status: record.status,
                marked_at: record.marked_at,
                session_code: session.as_ref().map(|s| s.code.clone()),
                department: session.map(|s| s.department),
            })
            .collect())
    }
}

fn already_marked_or(err: DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::AlreadyMarked
    } else {
        AppError::Database(err)
    }
}
