use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Set};
use serde::Serialize;

/// A teacher account in the `teachers` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "teachers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Unique login email.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Default department for sessions this teacher creates.
    pub department: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn hash_password(password: &str) -> Result<String, DbErr> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbErr::Custom(format!("password hashing failed: {e}")))
}

pub(crate) fn verify_hash(hash: &str, password: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

impl Model {
    pub async fn create(
        db: &DbConn,
        name: &str,
        email: &str,
        password: &str,
        department: &str,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();

        let active_model = ActiveModel {
            name: Set(name.to_owned()),
            email: Set(email.trim().to_lowercase()),
            password_hash: Set(hash_password(password)?),
            department: Set(department.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active_model.insert(db).await
    }

    pub async fn find_by_email(db: &DbConn, email: &str) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_hash(&self.password_hash, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn create_hashes_password_and_normalises_email() {
        let db = setup_test_db().await;
        let teacher = Model::create(&db, "Ada", " Ada@School.edu ", "s3cret!", "CSE")
            .await
            .unwrap();

        assert_eq!(teacher.email, "ada@school.edu");
        assert_ne!(teacher.password_hash, "s3cret!");
        assert!(teacher.verify_password("s3cret!"));
        assert!(!teacher.verify_password("wrong"));

        let found = Model::find_by_email(&db, "ADA@school.edu").await.unwrap();
        assert_eq!(found.map(|t| t.id), Some(teacher.id));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = setup_test_db().await;
        Model::create(&db, "Ada", "ada@school.edu", "pw", "CSE")
            .await
            .unwrap();
        assert!(
            Model::create(&db, "Other", "ada@school.edu", "pw", "ECE")
                .await
                .is_err()
        );
    }
}
