use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    AuthCodePurpose,
    AuthCodeIssuedAt,
    PhoneNumber,
    PhoneCode,
    PhoneCodeIssuedAt,
    PhoneVerified,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// SQLite 每条 ALTER 只能加一列
fn add_column(mut col: ColumnDef) -> TableAlterStatement {
    Table::alter().table(Users::Table).add_column(&mut col).to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let columns = [
            (
                "auth_code_purpose",
                ColumnDef::new(Users::AuthCodePurpose).integer().null().to_owned(),
            ),
            (
                "auth_code_issued_at",
                ColumnDef::new(Users::AuthCodeIssuedAt)
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned(),
            ),
            (
                "phone_number",
                ColumnDef::new(Users::PhoneNumber).string_len(11).null().to_owned(),
            ),
            (
                "phone_code",
                ColumnDef::new(Users::PhoneCode).string_len(8).null().to_owned(),
            ),
            (
                "phone_code_issued_at",
                ColumnDef::new(Users::PhoneCodeIssuedAt)
                    .timestamp_with_time_zone()
                    .null()
                    .to_owned(),
            ),
            (
                "phone_verified",
                ColumnDef::new(Users::PhoneVerified)
                    .boolean()
                    .not_null()
                    .default(false)
                    .to_owned(),
            ),
        ];

        for (name, col) in columns {
            if !manager.has_column("users", name).await? {
                manager.alter_table(add_column(col)).await?;
            }
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for col in [
            Users::PhoneVerified,
            Users::PhoneCodeIssuedAt,
            Users::PhoneCode,
            Users::PhoneNumber,
            Users::AuthCodeIssuedAt,
            Users::AuthCodePurpose,
        ] {
            manager
                .alter_table(Table::alter().table(Users::Table).drop_column(col).to_owned())
                .await?;
        }
        Ok(())
    }
}
