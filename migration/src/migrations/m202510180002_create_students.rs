use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510180002_create_students"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("students"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Alias::new("name")).string().not_null())
                    .col(ColumnDef::new(Alias::new("roll_number")).string().not_null().unique_key())
                    .col(ColumnDef::new(Alias::new("email")).string().not_null().unique_key())
                    .col(ColumnDef::new(Alias::new("department")).string().not_null())
                    .col(
                        ColumnDef::new(Alias::new("year"))
                            .integer()
                            .not_null()
                            .check(Expr::col(Alias::new("year")).between(1, 4)),
                    )
                    .col(ColumnDef::new(Alias::new("section")).string().null())
                    // durable half of the device binding
                    .col(ColumnDef::new(Alias::new("device_fingerprint")).string().null())
                    .col(ColumnDef::new(Alias::new("device_registered_at")).timestamp().null())
                    .col(ColumnDef::new(Alias::new("device_browser")).string().null())
                    .col(ColumnDef::new(Alias::new("device_os")).string().null())
                    .col(ColumnDef::new(Alias::new("device_platform")).string().null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("updated_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("students")).to_owned())
            .await
    }
}
