use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum CartItems {
    Table,
    Id,
    UserId,
    ProductId,
    Amount,
    CreatedAt,
    UpdatedAt,
}

/// Shipping envelope. Address columns hold ciphertext copied from the delivery.
#[derive(DeriveIden)]
enum Bills {
    Table,
    Id,
    UserId,
    Address,
    DetailAddress,
    Recipient,
    PostalCode,
    IsPaid,
    CreatedAt,
}

/// Purchased line snapshot. Only `order_status` and `updated_at` change after insert.
#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    BillId,
    ProductId,
    SellerId,
    Name,
    Price,
    Amount,
    OrderStatus,
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
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CartItems::UserId).big_integer().not_null())
                    .col(ColumnDef::new(CartItems::ProductId).big_integer().not_null())
                    .col(
                        ColumnDef::new(CartItems::Amount)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CartItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CartItems::UpdatedAt)
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
                    .name("idx_cart_items_user_product_unique")
                    .table(CartItems::Table)
                    .col(CartItems::UserId)
                    .col(CartItems::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bills::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bills::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Bills::Address).text().not_null())
                    .col(ColumnDef::new(Bills::DetailAddress).text().not_null())
                    .col(ColumnDef::new(Bills::Recipient).text().not_null())
                    .col(ColumnDef::new(Bills::PostalCode).text().not_null())
                    .col(
                        ColumnDef::new(Bills::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Bills::CreatedAt)
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
                    .name("idx_bills_user_id")
                    .table(Bills::Table)
                    .col(Bills::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::BillId).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::SellerId).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::Name).string_len(100).not_null())
                    .col(ColumnDef::new(OrderItems::Price).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::Amount).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::OrderStatus).integer().not_null())
                    .col(
                        ColumnDef::new(OrderItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::UpdatedAt)
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
                    .name("idx_order_items_bill_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::BillId)
                    .to_owned(),
            )
            .await?;

        // 自动确认收货任务按状态 + 更新时间扫描
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_items_status_updated_at")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderStatus)
                    .col(OrderItems::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItems::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bills::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CartItems::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
