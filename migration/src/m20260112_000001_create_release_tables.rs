use sea_orm_migration::prelude::*;

/// 阶段预算（如 S0），同一时间最多一个 active
#[derive(DeriveIden)]
enum StageBudgets {
    Table,
    Id,
    StageName,
    TotalBudget,
    UsedBudget,
    StartDate,
    EndDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

/// 自然周释放规则
#[derive(DeriveIden)]
enum WeeklyReleaseRules {
    Table,
    Id,
    StageId,
    WeekNumber,
    StartDate,
    EndDate,
    WeeklyPointsTarget,
    PGenesisPercent,
    PEcoPercent,
    PTradePercent,
    Status,
    ActualReleased,
    CreatedAt,
    UpdatedAt,
}

/// 周结算
#[derive(DeriveIden)]
enum Settlements {
    Table,
    Id,
    WeekNumber,
    Year,
    StartDate,
    EndDate,
    TotalPoints,
    GenesisPoints,
    EcoPoints,
    TradePoints,
    Status,
    ActualDistributionPoints,
    DistributedAt,
    StageId,
    ConfirmedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 并发约束交给索引兜底:
/// - stage_budgets: stage_name 唯一；status = 'active' 的部分唯一索引保证最多一个进行中阶段
/// - weekly_release_rules: 未结束规则的 (stage_id, start_date) 部分唯一索引
///   （周窗口已归一化到周一，同一周必然同一 start_date）
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StageBudgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StageBudgets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::StageName)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::TotalBudget)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::UsedBudget)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StageBudgets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_stage_budgets_single_active \
                 ON stage_budgets (status) WHERE status = 'active'",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WeeklyReleaseRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::StageId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::WeekNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::WeeklyPointsTarget)
                            .big_integer()
                            .not_null(),
                    )
                    // 百分比以十进制字符串保存
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::PGenesisPercent)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::PEcoPercent)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::PTradePercent)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::ActualReleased)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WeeklyReleaseRules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_weekly_release_rules_stage")
                            .from(WeeklyReleaseRules::Table, WeeklyReleaseRules::StageId)
                            .to(StageBudgets::Table, StageBudgets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_weekly_release_rules_stage_week \
                 ON weekly_release_rules (stage_id, start_date) WHERE status <> 'ended'",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settlements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settlements::WeekNumber).integer().not_null())
                    .col(ColumnDef::new(Settlements::Year).integer().not_null())
                    .col(
                        ColumnDef::new(Settlements::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Settlements::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Settlements::TotalPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Settlements::GenesisPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Settlements::EcoPoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Settlements::TradePoints)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Settlements::Status)
                            .string_len(16)
                            .not_null()
                            .default("preview"),
                    )
                    .col(
                        ColumnDef::new(Settlements::ActualDistributionPoints)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Settlements::DistributedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Settlements::StageId).big_integer().null())
                    .col(
                        ColumnDef::new(Settlements::ConfirmedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Settlements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Settlements::UpdatedAt)
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
                    .name("idx_settlements_year_week")
                    .table(Settlements::Table)
                    .col(Settlements::Year)
                    .col(Settlements::WeekNumber)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Settlements::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(WeeklyReleaseRules::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(StageBudgets::Table).to_owned())
            .await?;
        Ok(())
    }
}
