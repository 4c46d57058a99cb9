use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, QueryFilter, Set};
use serde::Serialize;

/// A student account in the `students` table.
///
/// The `device_*` columns are the durable half of the device binding; the
/// ephemeral half lives under `device:lock:{id}`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Unique institutional roll number (stored uppercase).
    pub roll_number: String,
    pub email: String,
    pub department: String,
    /// Year of study, 1 to 4.
    pub year: i32,
    pub section: Option<String>,
    pub device_fingerprint: Option<String>,
    pub device_registered_at: Option<DateTime<Utc>>,
    pub device_browser: Option<String>,
    pub device_os: Option<String>,
    pub device_platform: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Attendance,
    #[sea_orm(has_many = "super::token_history::Entity")]
    TokenHistory,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl Related<super::token_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TokenHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub roll_number: String,
    pub email: String,
    pub department: String,
    pub year: i32,
    pub section: Option<String>,
}

/// Parsed client details stored alongside a bound fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceDetails {
    pub browser: Option<String>,
    pub os: Option<String>,
    pub platform: Option<String>,
}

impl Model {
    pub async fn create(db: &DbConn, new: NewStudent) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active_model = ActiveModel {
            name: Set(new.name.trim().to_owned()),
            roll_number: Set(new.roll_number.trim().to_uppercase()),
            email: Set(new.email.trim().to_lowercase()),
            department: Set(new.department),
            year: Set(new.year),
            section: Set(new.section),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    /// Looks up an existing account by either unique identifier.
    pub async fn find_by_roll_or_email(
        db: &DbConn,
        roll_number: &str,
        email: &str,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(
                Condition::any()
                    .add(Column::RollNumber.eq(roll_number.trim().to_uppercase()))
                    .add(Column::Email.eq(email.trim().to_lowercase())),
            )
            .one(db)
            .await
    }

    pub async fn bind_device(
        db: &DbConn,
        student_id: i64,
        fingerprint: &str,
        details: DeviceDetails,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(student_id),
            device_fingerprint: Set(Some(fingerprint.to_owned())),
            device_registered_at: Set(Some(now)),
            device_browser: Set(details.browser),
            device_os: Set(details.os),
            device_platform: Set(details.platform),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model.update(db).await
    }

    /// Clears every durable device field. Succeeds when nothing was bound.
    pub async fn clear_device(db: &DbConn, student_id: i64) -> Result<Model, DbErr> {
        let active_model = ActiveModel {
            id: Set(student_id),
            device_fingerprint: Set(None),
            device_registered_at: Set(None),
            device_browser: Set(None),
            device_os: Set(None),
            device_platform: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        active_model.update(db).await
    }
}
