use crate::entities::{PointType, point_entity as points};
use crate::error::{AppError, AppResult};
use crate::models::{
    AttendanceResponse, BalanceResponse, PaginatedResponse, PaginationParams, PointEntryResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

pub const ATTENDANCE_POINTS: i64 = 100;

#[derive(Debug, FromQueryResult)]
struct TypeTotal {
    point_type: i32,
    total: i64,
}

/// 用户积分余额：Σ 收入 − Σ 支出，每次调用都重新计算。
///
/// 接受任意连接，结算和续费可以在各自的事务中读取。
pub async fn net_balance_on<C: ConnectionTrait>(conn: &C, user_id: i64) -> AppResult<i64> {
    let totals = points::Entity::find()
        .select_only()
        .column(points::Column::PointType)
        .column_as(Expr::cust("CAST(COALESCE(SUM(amount), 0) AS BIGINT)"), "total")
        .filter(points::Column::UserId.eq(user_id))
        .group_by(points::Column::PointType)
        .into_model::<TypeTotal>()
        .all(conn)
        .await?;

    let mut balance = 0i64;
    for row in totals {
        let point_type = PointType::try_from_value(&row.point_type)?;
        balance += point_type.signed(row.total);
    }
    Ok(balance)
}

/// 追加一条积分流水。金额不能为负，方向由类型决定。
pub async fn record_entry<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    point_type: PointType,
    amount: i64,
) -> AppResult<points::Model> {
    record_entry_at(conn, user_id, point_type, amount, Utc::now()).await
}

/// 同 [`record_entry`]，时间戳由调用方给出
pub async fn record_entry_at<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    point_type: PointType,
    amount: i64,
    at: DateTime<Utc>,
) -> AppResult<points::Model> {
    insert_entry(conn, user_id, point_type, amount, at, None).await
}

async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
    point_type: PointType,
    amount: i64,
    at: DateTime<Utc>,
    attended_on: Option<NaiveDate>,
) -> AppResult<points::Model> {
    if amount < 0 {
        return Err(AppError::ValidationError(
            "Point amount cannot be negative".to_string(),
        ));
    }

    let entry = points::ActiveModel {
        user_id: Set(user_id),
        point_type: Set(point_type),
        amount: Set(amount),
        attended_on: Set(attended_on),
        created_at: Set(at),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    log::debug!("point entry user={user_id} type={point_type:?} amount={amount}");
    Ok(entry)
}

#[derive(Clone)]
pub struct PointService {
    pool: DatabaseConnection,
}

impl PointService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn balance(&self, user_id: i64) -> AppResult<BalanceResponse> {
        let balance = net_balance_on(&self.pool, user_id).await?;
        Ok(BalanceResponse { balance })
    }

    /// 积分流水（最新在前）
    pub async fn history(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<PointEntryResponse>> {
        let base_query = points::Entity::find().filter(points::Column::UserId.eq(user_id));

        let total = base_query.clone().count(&self.pool).await? as i64;

        let items = base_query
            .order_by_desc(points::Column::CreatedAt)
            .order_by_desc(points::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    /// 每日签到，同一自然日（UTC）只能领取一次。
    ///
    /// 由 (user_id, attended_on) 唯一索引保证，并发的重复签到在插入时失败。
    pub async fn attend(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<AttendanceResponse> {
        let inserted = insert_entry(
            &self.pool,
            user_id,
            PointType::Attendance,
            ATTENDANCE_POINTS,
            now,
            Some(now.date_naive()),
        )
        .await;
        match inserted {
            Ok(_) => {}
            Err(AppError::DatabaseError(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                return Err(AppError::Conflict("Already checked in today".to_string()));
            }
            Err(e) => return Err(e),
        }
        let balance = net_balance_on(&self.pool, user_id).await?;

        log::info!("User {user_id} checked in, balance {balance}");
        Ok(AttendanceResponse {
            earned: ATTENDANCE_POINTS,
            balance,
        })
    }
}
