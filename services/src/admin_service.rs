//! Administrative overrides on students, sessions, records and the ephemeral store.

use cache::{
    TokenManager,
    tokens::{COOLDOWN_PREFIX, DEVICE_PREFIX, RATE_LIMIT_PREFIX, SESSION_PREFIX},
};
use db::models::{attendance_record, attendance_session, student, token_history};
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait, TransactionTrait, sea_query::Expr};
use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::device_service::DeviceService;
use crate::error::{AppError, AppResult};

const DETAIL_ATTENDANCE_LIMIT: u64 = 50;
const DETAIL_HISTORY_LIMIT: u64 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct StudentDetails {
    pub student: student::Model,
    pub attendance: Vec<attendance_record::Model>,
    pub token_history: Vec<token_history::Model>,
    pub token_cooldown: u64,
    pub bound_device: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    pub total_keys: usize,
    pub token_cooldowns: usize,
    pub device_locks: usize,
    pub cached_sessions: usize,
    pub rate_limit_keys: usize,
    pub all_keys: Vec<String>,
}

/// Key families an admin may flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FlushTarget {
    Tokens,
    Devices,
    Sessions,
    Ratelimits,
    All,
}

impl FlushTarget {
    fn pattern(self) -> &'static str {
        match self {
            FlushTarget::Tokens => "token:cooldown:*",
            FlushTarget::Devices => "device:lock:*",
            FlushTarget::Sessions => "session:*",
            FlushTarget::Ratelimits => "rl:*",
            FlushTarget::All => "*",
        }
    }
}

pub struct AdminService;

impl AdminService {
    pub async fn student_details(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        student_id: i64,
    ) -> AppResult<StudentDetails> {
        let student = find_student(db, student_id).await?;

        let attendance =
            attendance_record::Model::recent_for_student(db, student_id, DETAIL_ATTENDANCE_LIMIT).await?;
        let token_history =
            token_history::Model::recent_for_student(db, student_id, DETAIL_HISTORY_LIMIT).await?;

        let token_cooldown = tokens.cooldown_remaining(student_id).await;
        let bound_device = tokens.bound_device(student_id).await.unwrap_or_else(|e| {
            warn!(student_id, error = %e, "Device lock lookup failed");
            None
        });

        Ok(StudentDetails {
            student,
            attendance,
            token_history,
            token_cooldown,
            bound_device,
        })
    }

    pub async fn reset_device(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        student_id: i64,
    ) -> AppResult<student::Model> {
        let student = find_student(db, student_id).await?;
        DeviceService::reset(db, tokens, student.id).await?;
        Ok(student)
    }

    /// Clears the cooldown. Idempotent.
    pub async fn reset_token(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        student_id: i64,
    ) -> AppResult<student::Model> {
        let student = find_student(db, student_id).await?;
        tokens.reset_cooldown(student.id).await?;
        info!(student_id, "Token cooldown reset");
        Ok(student)
    }

    /// Deletes the student with its attendance and token history in one
    /// transaction, then drops the student's ephemeral keys.
    pub async fn delete_student(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        student_id: i64,
    ) -> AppResult<student::Model> {
        let student = find_student(db, student_id).await?;

        let txn = db.begin().await?;
        let records = attendance_record::Model::delete_for_student(&txn, student_id).await?;
        let history = token_history::Model::delete_for_student(&txn, student_id).await?;
        student.clone().delete(&txn).await?;
        txn.commit().await?;

        if let Err(e) = tokens.unlock_device(student_id).await {
            warn!(student_id, error = %e, "Failed to drop device lock for deleted student");
        }
        if let Err(e) = tokens.reset_cooldown(student_id).await {
            warn!(student_id, error = %e, "Failed to drop cooldown for deleted student");
        }

        info!(student_id, records, history, "Student deleted");
        Ok(student)
    }

    pub async fn force_end_session(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        session_id: i64,
    ) -> AppResult<attendance_session::Model> {
        crate::session_service::SessionService::end(db, tokens, session_id, None).await
    }

    pub async fn delete_attendance(db: &DatabaseConnection, record_id: i64) -> AppResult<()> {
        let res = attendance_record::Entity::delete_by_id(record_id).exec(db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Record not found".into()));
        }
        info!(record_id, "Attendance record deleted");
        Ok(())
    }

    pub async fn store_stats(tokens: &TokenManager) -> AppResult<StoreStats> {
        let keys = tokens.store().keys("*").await?;
        let count = |prefix: &str| keys.iter().filter(|k| k.starts_with(prefix)).count();

        Ok(StoreStats {
            total_keys: keys.len(),
            token_cooldowns: count(COOLDOWN_PREFIX),
            device_locks: count(DEVICE_PREFIX),
            cached_sessions: count(SESSION_PREFIX),
            rate_limit_keys: count(RATE_LIMIT_PREFIX),
            all_keys: keys,
        })
    }

    /// Deletes one key family and returns how many keys went.
    ///
    /// Flushing devices also clears every durable binding, otherwise the
    /// durable fallback would restore the locks on the next scan.
    pub async fn flush_store(
        db: &DatabaseConnection,
        tokens: &TokenManager,
        target: FlushTarget,
    ) -> AppResult<usize> {
        let store = tokens.store();

        if target == FlushTarget::All {
            let count = store.keys("*").await?.len();
            store.flush().await?;
            warn!(count, "Ephemeral store flushed");
            return Ok(count);
        }

        let keys = store.keys(target.pattern()).await?;
        for key in &keys {
            store.del(key).await?;
        }

        if target == FlushTarget::Devices {
            let res = student::Entity::update_many()
                .col_expr(student::Column::DeviceFingerprint, Expr::value(Option::<String>::None))
                .col_expr(student::Column::DeviceRegisteredAt, Expr::value(Option::<String>::None))
                .col_expr(student::Column::DeviceBrowser, Expr::value(Option::<String>::None))
                .col_expr(student::Column::DeviceOs, Expr::value(Option::<String>::None))
                .col_expr(student::Column::DevicePlatform, Expr::value(Option::<String>::None))
                .exec(db)
                .await?;
            info!(students = res.rows_affected, "Durable device bindings cleared");
        }

        info!(family = %target, count = keys.len(), "Ephemeral keys flushed");
        Ok(keys.len())
    }
}

async fn find_student(db: &DatabaseConnection, student_id: i64) -> AppResult<student::Model> {
    student::Entity::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}
