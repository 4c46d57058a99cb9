use chrono::{DateTime, Utc};
use sea_orm::DeriveActiveEnum;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One mark of one student in one session. `(session_id, student_id)` is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub session_id: i64,
    pub student_id: i64,
    pub teacher_id: i64,
    pub subject: String,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
    pub device_fingerprint: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "late")]
    Late,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub session_id: i64,
    pub student_id: i64,
    pub teacher_id: i64,
    pub subject: String,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
    pub device_fingerprint: Option<String>,
}

/// True when `err` came from the `(session_id, student_id)` unique index.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl Model {
    pub async fn find_for_student_in_session<C: ConnectionTrait>(
        conn: &C,
        session_id: i64,
        student_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .filter(Column::StudentId.eq(student_id))
            .one(conn)
            .await
    }

    pub async fn create<C: ConnectionTrait>(conn: &C, new: NewAttendance) -> Result<Model, DbErr> {
        let active_model = ActiveModel {
            session_id: Set(new.session_id),
            student_id: Set(new.student_id),
            teacher_id: Set(new.teacher_id),
            subject: Set(new.subject),
            status: Set(new.status),
            marked_at: Set(new.marked_at),
            device_fingerprint: Set(new.device_fingerprint),
            ..Default::default()
        };

        active_model.insert(conn).await
    }

    /// Newest first, at most `limit` rows.
    pub async fn recent_for_student(db: &DbConn, student_id: i64, limit: u64) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::MarkedAt)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn count_for_session(db: &DbConn, session_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::SessionId.eq(session_id))
            .count(db)
            .await
    }

    pub async fn delete_for_student<C: ConnectionTrait>(conn: &C, student_id: i64) -> Result<u64, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::StudentId.eq(student_id))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }
}
