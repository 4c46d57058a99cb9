use axum::{Json, extract::State, http::StatusCode};
use db::models::{
    admin, attendance_record::is_unique_violation,
    student::{self, NewStudent},
    teacher,
};
use serde::{Deserialize, Serialize};
use services::AppError;
use tracing::info;
use util::state::AppState;
use validator::Validate;

use crate::auth::{Role, generate_jwt};
use crate::response::{ApiError, ApiResponse};
use crate::routes::common::{ApiJson, format_validation_errors};

type HandlerResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 30, message = "Roll number is required"))]
    pub roll_number: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Department is required"))]
    pub department: String,

    #[validate(range(min = 1, max = 4, message = "Year must be between 1 and 4"))]
    pub year: i32,

    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse<T: Serialize> {
    pub token: String,
    pub expires_at: String,
    pub account: T,
}

fn validate<T: Validate>(req: &T) -> Result<(), ApiError> {
    req.validate()
        .map_err(|e| ApiError(AppError::Validation(format_validation_errors(&e))))
}

fn issue<T: Serialize>(id: i64, role: Role, account: T) -> Result<TokenResponse<T>, ApiError> {
    let (token, expires_at) = generate_jwt(id, role)
        .map_err(|e| ApiError(AppError::Internal(format!("Token encoding failed: {e}"))))?;
    Ok(TokenResponse {
        token,
        expires_at,
        account,
    })
}

fn invalid_credentials() -> ApiError {
    ApiError(AppError::Unauthorized("Invalid credentials".into()))
}

/// POST /auth/teacher/login
///
/// ### Request Body
/// ```json
/// { "email": "ada@college.edu", "password": "secret123" }
/// ```
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "jwt_token_here",
///     "expires_at": "2025-10-19T11:00:00Z",
///     "account": { "id": 1, "name": "Ada", "email": "ada@college.edu", "department": "CSE" }
///   },
///   "message": "Login successful"
/// }
/// ```
/// - `400 Bad Request` (validation failure)
/// - `401 Unauthorized` (`"Invalid credentials"`)
pub async fn teacher_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> HandlerResult<TokenResponse<teacher::Model>> {
    validate(&req)?;

    let teacher = teacher::Model::find_by_email(state.db(), &req.email)
        .await
        .map_err(AppError::from)?
        .filter(|t| t.verify_password(&req.password))
        .ok_or_else(invalid_credentials)?;

    info!(teacher_id = teacher.id, "Teacher logged in");
    let body = issue(teacher.id, Role::Teacher, teacher)?;
    Ok((StatusCode::OK, Json(ApiResponse::success(body, "Login successful"))))
}

/// POST /auth/admin/login
///
/// Same contract as the teacher login; the account carries the admin `role`.
///
/// - `200 OK` with `"Admin login successful"`
/// - `401 Unauthorized` (`"Invalid credentials"`)
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> HandlerResult<TokenResponse<admin::Model>> {
    validate(&req)?;

    let admin = admin::Model::find_by_email(state.db(), &req.email)
        .await
        .map_err(AppError::from)?
        .filter(|a| a.verify_password(&req.password))
        .ok_or_else(invalid_credentials)?;

    info!(admin_id = admin.id, "Admin logged in");
    let body = issue(admin.id, Role::Admin, admin)?;
    Ok((StatusCode::OK, Json(ApiResponse::success(body, "Admin login successful"))))
}

/// POST /auth/student/register
///
/// Registers a student, or logs in the existing account when the roll number
/// or email is already known. Students have no password; the device binding
/// is what ties an account to a person.
///
/// ### Request Body
/// ```json
/// {
///   "name": "Grace",
///   "roll_number": "21CS042",
///   "email": "grace@college.edu",
///   "department": "CSE",
///   "year": 2,
///   "section": "A"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` (`"Registration successful"`)
/// - `200 OK` (`"Student already registered. Logged in."`)
/// - `400 Bad Request` (validation failure or a concurrent duplicate)
pub async fn student_register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> HandlerResult<TokenResponse<student::Model>> {
    validate(&req)?;
    let db = state.db();

    if let Some(existing) = student::Model::find_by_roll_or_email(db, &req.roll_number, &req.email)
        .await
        .map_err(AppError::from)?
    {
        let body = issue(existing.id, Role::Student, existing)?;
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::success(body, "Student already registered. Logged in.")),
        ));
    }

    let created = student::Model::create(
        db,
        NewStudent {
            name: req.name,
            roll_number: req.roll_number,
            email: req.email,
            department: req.department,
            year: req.year,
            section: req.section.filter(|s| !s.trim().is_empty()),
        },
    )
    .await;

    let student = match created {
        Ok(student) => student,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError(AppError::Validation(
                "Student with this email or roll number already exists".into(),
            )));
        }
        Err(e) => return Err(ApiError(AppError::from(e))),
    };

    info!(student_id = student.id, "Student registered");
    let body = issue(student.id, Role::Student, student)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(body, "Registration successful"))))
}
