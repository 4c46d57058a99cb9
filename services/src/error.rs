use cache::StoreError;
use sea_orm::DbErr;

pub type AppResult<T> = Result<T, AppError>;

/// Every way an attendance, session or admin operation can fail.
///
/// Validation, policy and contention variants are expected outcomes and carry a
/// stable [`AppError::reason`] code. `Database` and `Store` are infrastructure
/// failures and are reported as a generic server error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Request already being processed. Please wait a moment.")]
    DuplicateRequest,

    #[error("Another scan is in progress. Please wait.")]
    ScanInProgress,

    #[error("You already marked attendance recently. Try again in {} minute(s).", .remaining_seconds.div_ceil(60))]
    CooldownActive { remaining_seconds: u64 },

    #[error("Access denied. This account is already linked to another device.")]
    DeviceMismatch,

    #[error("Session has expired")]
    SessionExpired,

    #[error("Session not found or no longer active")]
    SessionNotFound,

    #[error("Attendance already marked for this session")]
    AlreadyMarked,

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Ephemeral store error: {0}")]
    Store(#[from] StoreError),

    #[error("QR generation failed: {0}")]
    Qr(String),

    #[error("{0}")]
    Internal(String),
}

/// Whole minutes, rounded up.
pub fn cooldown_minutes(seconds: u64) -> u64 {
    seconds.div_ceil(60)
}

impl AppError {
    /// Stable machine-readable code included in every rejection body.
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::DuplicateRequest => "duplicate_request",
            AppError::ScanInProgress => "scan_in_progress",
            AppError::CooldownActive { .. } => "cooldown_active",
            AppError::DeviceMismatch => "device_mismatch",
            AppError::SessionExpired => "session_expired",
            AppError::SessionNotFound => "session_not_found",
            AppError::AlreadyMarked => "already_marked",
            AppError::Database(_) | AppError::Store(_) | AppError::Qr(_) | AppError::Internal(_) => {
                "internal_error"
            }
        }
    }

    /// Infrastructure failures; everything else is an expected rejection.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Store(_) | AppError::Qr(_) | AppError::Internal(_)
        )
    }

    pub fn cooldown_remaining(&self) -> Option<u64> {
        match self {
            AppError::CooldownActive { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        }
    }
}
