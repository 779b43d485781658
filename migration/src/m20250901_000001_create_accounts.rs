use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Nickname,
    PasswordHash,
    AuthCode,
    LoginAttemptsCount,
    IsActive,
    IsSeller,
    IsAdmin,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

/// Seller profile, one per user. Bank columns hold ciphertext.
#[derive(DeriveIden)]
enum Sellers {
    Table,
    Id,
    UserId,
    CompanyName,
    BusinessNumber,
    BusinessOwnerName,
    ContactNumber,
    BankName,
    AccountNumber,
    AccountHolder,
    CreatedAt,
    UpdatedAt,
}

/// Delivery addresses. Every address column holds ciphertext.
#[derive(DeriveIden)]
enum Deliveries {
    Table,
    Id,
    UserId,
    Address,
    DetailAddress,
    Recipient,
    PostalCode,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string_len(100).not_null())
                    .col(ColumnDef::new(Users::Nickname).string_len(20).not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string_len(128).not_null())
                    .col(ColumnDef::new(Users::AuthCode).string_len(128).null())
                    .col(
                        ColumnDef::new(Users::LoginAttemptsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsSeller)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::LastLogin).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email_unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sellers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sellers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sellers::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Sellers::CompanyName).string_len(20).not_null())
                    .col(ColumnDef::new(Sellers::BusinessNumber).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Sellers::BusinessOwnerName)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sellers::ContactNumber).string_len(20).not_null())
                    .col(ColumnDef::new(Sellers::BankName).text().not_null())
                    .col(ColumnDef::new(Sellers::AccountNumber).text().not_null())
                    .col(ColumnDef::new(Sellers::AccountHolder).text().not_null())
                    .col(
                        ColumnDef::new(Sellers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sellers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个用户只能有一个卖家档案
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sellers_user_unique")
                    .table(Sellers::Table)
                    .col(Sellers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Deliveries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deliveries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Deliveries::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Deliveries::Address).text().not_null())
                    .col(ColumnDef::new(Deliveries::DetailAddress).text().not_null())
                    .col(ColumnDef::new(Deliveries::Recipient).text().not_null())
                    .col(ColumnDef::new(Deliveries::PostalCode).text().not_null())
                    .col(
                        ColumnDef::new(Deliveries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_deliveries_user_id")
                    .table(Deliveries::Table)
                    .col(Deliveries::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deliveries::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sellers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
