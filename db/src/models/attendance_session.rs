use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::Serialize;

/// A time-boxed attendance window identified by an unguessable `code`.
///
/// The row is authoritative. A session accepts scans only while
/// [`Model::is_live`] holds.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// UUID v4 string embedded in the QR payload.
    #[sea_orm(unique)]
    pub code: String,
    pub teacher_id: i64,
    pub subject: String,
    pub department: String,
    pub year: Option<i32>,
    pub section: Option<String>,
    /// JSON document rendered into the QR code.
    pub qr_payload: String,
    pub active: bool,
    pub expires_at: DateTime<Utc>,
    /// Durable count of marks, updated inside the marking transaction.
    pub scan_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Teacher,
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub code: String,
    pub teacher_id: i64,
    pub subject: String,
    pub department: String,
    pub year: Option<i32>,
    pub section: Option<String>,
    pub qr_payload: String,
    pub expires_at: DateTime<Utc>,
}

impl Model {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }

    pub async fn create(db: &DbConn, new: NewSession) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active_model = ActiveModel {
            code: Set(new.code),
            teacher_id: Set(new.teacher_id),
            subject: Set(new.subject),
            department: Set(new.department),
            year: Set(new.year),
            section: Set(new.section),
            qr_payload: Set(new.qr_payload),
            active: Set(true),
            expires_at: Set(new.expires_at),
            scan_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    /// Durable lookup used on a cache miss: only live sessions match.
    pub async fn find_live_by_code(
        db: &DbConn,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Code.eq(code))
            .filter(Column::Active.eq(true))
            .filter(Column::ExpiresAt.gt(now))
            .one(db)
            .await
    }

    /// Finds a session only if `teacher_id` owns it.
    pub async fn find_owned(
        db: &DbConn,
        session_id: i64,
        teacher_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(session_id)
            .filter(Column::TeacherId.eq(teacher_id))
            .one(db)
            .await
    }

    pub async fn active_for_teacher(
        db: &DbConn,
        teacher_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::Active.eq(true))
            .filter(Column::ExpiresAt.gt(now))
            .order_by_desc(Column::CreatedAt)
            .all(db)
            .await
    }

    pub async fn recent_for_teacher(
        db: &DbConn,
        teacher_id: i64,
        limit: u64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn deactivate(db: &DbConn, session_id: i64) -> Result<Model, DbErr> {
        let active_model = ActiveModel {
            id: Set(session_id),
            active: Set(false),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model.update(db).await
    }

    /// Atomic `scan_count = scan_count + 1`; runs inside the marking transaction.
    pub async fn increment_scan_count<C: ConnectionTrait>(
        conn: &C,
        session_id: i64,
    ) -> Result<(), DbErr> {
        Entity::update_many()
            .col_expr(Column::ScanCount, Expr::col(Column::ScanCount).add(1))
            .filter(Column::Id.eq(session_id))
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Flags every expired-but-active session inactive. Returns the affected codes.
    pub async fn deactivate_expired(db: &DbConn, now: DateTime<Utc>) -> Result<Vec<String>, DbErr> {
        let expired: Vec<String> = Entity::find()
            .select_only()
            .column(Column::Code)
            .filter(Column::Active.eq(true))
            .filter(Column::ExpiresAt.lte(now))
            .into_tuple()
            .all(db)
            .await?;

        if expired.is_empty() {
            return Ok(expired);
        }

        Entity::update_many()
            .col_expr(Column::Active, Expr::value(false))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Code.is_in(expired.clone()))
            .exec(db)
            .await?;

        Ok(expired)
    }
}
