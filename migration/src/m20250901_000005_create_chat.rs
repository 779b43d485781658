use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum ChatRooms {
    Table,
    Id,
    AuthorId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RoomMessages {
    Table,
    Id,
    AuthorId,
    RoomId,
    Content,
    IsRead,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RoomParticipants {
    Table,
    Id,
    RoomId,
    UserId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChatRooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatRooms::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatRooms::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(ChatRooms::Name).string_len(20).not_null())
                    .col(ColumnDef::new(ChatRooms::Description).string_len(100).not_null())
                    .col(
                        ColumnDef::new(ChatRooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChatRooms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoomMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoomMessages::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoomMessages::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(RoomMessages::RoomId).big_integer().not_null())
                    .col(ColumnDef::new(RoomMessages::Content).text().not_null())
                    .col(
                        ColumnDef::new(RoomMessages::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(RoomMessages::CreatedAt)
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
                    .name("idx_room_messages_room_created")
                    .table(RoomMessages::Table)
                    .col(RoomMessages::RoomId)
                    .col(RoomMessages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoomParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoomParticipants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoomParticipants::RoomId).big_integer().not_null())
                    .col(ColumnDef::new(RoomParticipants::UserId).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_room_participants_room_user_unique")
                    .table(RoomParticipants::Table)
                    .col(RoomParticipants::RoomId)
                    .col(RoomParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoomParticipants::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RoomMessages::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChatRooms::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
