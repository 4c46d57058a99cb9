use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use serde::Serialize;

/// Audit trail of consumed scan tokens. Never read by the marking path.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "token_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub session_id: i64,
    pub device_fingerprint: Option<String>,
    pub used_at: DateTime<Utc>,
    /// Rows past this instant are removed by the expiry sweeper.
    pub expires_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn record(
        db: &DbConn,
        student_id: i64,
        session_id: i64,
        device_fingerprint: Option<String>,
        cooldown: Duration,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active_model = ActiveModel {
            student_id: Set(student_id),
            session_id: Set(session_id),
            device_fingerprint: Set(device_fingerprint),
            used_at: Set(now),
            expires_at: Set(now + cooldown),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    pub async fn recent_for_student(
        db: &DbConn,
        student_id: i64,
        limit: u64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::UsedAt)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn delete_for_student<C: ConnectionTrait>(conn: &C, student_id: i64) -> Result<u64, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::StudentId.eq(student_id))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_expired(db: &DbConn, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let res = Entity::delete_many()
            .filter(Column::ExpiresAt.lte(now))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }
}
