use sea_orm_migration::prelude::*;

use crate::m20260105_000001_create_users_and_points_records::Users;

/// 工单（bug / 建议 / 情报）
#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    UserId,
    TicketType,
    Title,
    Content,
    Priority,
    Status,
    BaseScore,
    FinalScore,
    ReviewNote,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
    UpdatedAt,
}

/// 直播场次（主播侧原始数据）
#[derive(DeriveIden)]
enum LiveStreams {
    Table,
    Id,
    UserId,
    DurationMinutes,
    AvgCcu,
    ValidChatCount,
    ReceivedTipFee,
    FeaturedPostCount,
    Score,
    Status,
    FreezeReason,
    CreatedAt,
    UpdatedAt,
}

/// 交易记录
#[derive(DeriveIden)]
enum TradeRecords {
    Table,
    Id,
    UserId,
    Volume,
    FeeAmount,
    HoldingDurationHours,
    OrderCount,
    IsValidOpen,
    Score,
    Status,
    FreezeReason,
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
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::TicketType).string_len(16).not_null())
                    .col(ColumnDef::new(Tickets::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Tickets::Content).text().not_null())
                    .col(ColumnDef::new(Tickets::Priority).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Tickets::BaseScore).big_integer().not_null())
                    .col(ColumnDef::new(Tickets::FinalScore).big_integer().null())
                    .col(ColumnDef::new(Tickets::ReviewNote).text().null())
                    .col(ColumnDef::new(Tickets::ReviewedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Tickets::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_user")
                            .from(Tickets::Table, Tickets::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tickets_status")
                    .table(Tickets::Table)
                    .col(Tickets::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LiveStreams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LiveStreams::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LiveStreams::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(LiveStreams::DurationMinutes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LiveStreams::AvgCcu).big_integer().not_null())
                    .col(
                        ColumnDef::new(LiveStreams::ValidChatCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LiveStreams::ReceivedTipFee)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LiveStreams::FeaturedPostCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LiveStreams::Score).string_len(64).not_null())
                    .col(
                        ColumnDef::new(LiveStreams::Status)
                            .string_len(16)
                            .not_null()
                            .default("normal"),
                    )
                    .col(ColumnDef::new(LiveStreams::FreezeReason).text().null())
                    .col(
                        ColumnDef::new(LiveStreams::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LiveStreams::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_live_streams_user")
                            .from(LiveStreams::Table, LiveStreams::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TradeRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TradeRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TradeRecords::UserId).big_integer().not_null())
                    .col(ColumnDef::new(TradeRecords::Volume).string_len(64).not_null())
                    .col(
                        ColumnDef::new(TradeRecords::FeeAmount)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradeRecords::HoldingDurationHours)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradeRecords::OrderCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TradeRecords::IsValidOpen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(TradeRecords::Score).string_len(64).not_null())
                    .col(
                        ColumnDef::new(TradeRecords::Status)
                            .string_len(16)
                            .not_null()
                            .default("normal"),
                    )
                    .col(ColumnDef::new(TradeRecords::FreezeReason).text().null())
                    .col(
                        ColumnDef::new(TradeRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TradeRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trade_records_user")
                            .from(TradeRecords::Table, TradeRecords::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_trade_records_status")
                    .table(TradeRecords::Table)
                    .col(TradeRecords::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(TradeRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(LiveStreams::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Tickets::Table).to_owned())
            .await?;
        Ok(())
    }
}
