use sea_orm_migration::prelude::*;

/// Append-only point ledger. `amount` is never negative; the sign comes from `point_type`.
#[derive(DeriveIden)]
enum Points {
    Table,
    Id,
    UserId,
    PointType,
    Amount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    UserId,
    Subscribe,
    NextPayment,
    LastRenewedOn,
    CreatedAt,
    UpdatedAt,
}

/// Point top-ups registered with the payment gateway.
#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    UserId,
    MerchantUid,
    ImpUid,
    Amount,
    Status,
    PayMethod,
    ReceiptUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Points::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Points::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Points::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Points::PointType).integer().not_null())
                    .col(ColumnDef::new(Points::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Points::CreatedAt)
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
                    .name("idx_points_user_type")
                    .table(Points::Table)
                    .col(Points::UserId)
                    .col(Points::PointType)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::Subscribe)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Subscriptions::NextPayment).date().not_null())
                    .col(ColumnDef::new(Subscriptions::LastRenewedOn).date().null())
                    .col(
                        ColumnDef::new(Subscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 一对一：每个用户最多一条订阅记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subscriptions_user_unique")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Payments::MerchantUid).string_len(64).not_null())
                    .col(ColumnDef::new(Payments::ImpUid).string_len(64).null())
                    .col(ColumnDef::new(Payments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Payments::PayMethod).string_len(32).null())
                    .col(ColumnDef::new(Payments::ReceiptUrl).string_len(255).null())
                    .col(
                        ColumnDef::new(Payments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::UpdatedAt)
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
                    .name("idx_payments_merchant_uid_unique")
                    .table(Payments::Table)
                    .col(Payments::MerchantUid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Points::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
