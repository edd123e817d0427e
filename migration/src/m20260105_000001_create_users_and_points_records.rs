use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    TradingVolume,
    StreamingMinutes,
    WatchingMinutes,
    PostCount,
    IsBlacklisted,
    CreatedAt,
    UpdatedAt,
}

/// 积分流水（账本），余额由 approved 记录求和得出
#[derive(DeriveIden)]
enum PointsRecords {
    Table,
    Id,
    UserId,
    Pool,
    SubType,
    Amount,
    Status,
    RelatedId,
    Reason,
    ApprovedAt,
    ApprovedBy,
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
                    .col(
                        ColumnDef::new(Users::Username)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    // 十进制字符串，避免浮点误差
                    .col(
                        ColumnDef::new(Users::TradingVolume)
                            .string_len(64)
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Users::StreamingMinutes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::WatchingMinutes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::PostCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::IsBlacklisted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
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
            .create_table(
                Table::create()
                    .table(PointsRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointsRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PointsRecords::UserId).big_integer().not_null())
                    .col(ColumnDef::new(PointsRecords::Pool).string_len(16).not_null())
                    .col(
                        ColumnDef::new(PointsRecords::SubType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointsRecords::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(PointsRecords::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(PointsRecords::RelatedId).big_integer().null())
                    .col(ColumnDef::new(PointsRecords::Reason).text().null())
                    .col(
                        ColumnDef::new(PointsRecords::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PointsRecords::ApprovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(PointsRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_points_records_user")
                            .from(PointsRecords::Table, PointsRecords::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_points_records_user")
                    .table(PointsRecords::Table)
                    .col(PointsRecords::UserId)
                    .to_owned(),
            )
            .await?;

        // 按 (pool, related_id) 冻结 / 结算排除时使用
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_points_records_pool_related")
                    .table(PointsRecords::Table)
                    .col(PointsRecords::Pool)
                    .col(PointsRecords::RelatedId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_points_records_created_at")
                    .table(PointsRecords::Table)
                    .col(PointsRecords::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PointsRecords::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}
