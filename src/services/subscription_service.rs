use crate::entities::{PointType, subscription_entity as subscriptions};
use crate::error::{AppError, AppResult};
use crate::models::{RenewalReport, SubscriptionResponse};
use crate::services::point_service::{net_balance_on, record_entry_at};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

pub const SUBSCRIPTION_FEE: i64 = 9_900;
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 28;

#[derive(Clone)]
pub struct SubscriptionService {
    pool: DatabaseConnection,
}

impl SubscriptionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: i64) -> AppResult<SubscriptionResponse> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))
    }

    /// 订阅：立即扣除首期费用
    pub async fn subscribe(&self, user_id: i64, today: NaiveDate) -> AppResult<SubscriptionResponse> {
        let txn = self.pool.begin().await?;

        let existing = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        if existing.as_ref().is_some_and(|s| s.subscribe) {
            return Err(AppError::Conflict("Already subscribed".to_string()));
        }

        let balance = net_balance_on(&txn, user_id).await?;
        if balance < SUBSCRIPTION_FEE {
            return Err(AppError::InsufficientPoints {
                balance,
                required: SUBSCRIPTION_FEE,
            });
        }
        let now = Utc::now();
        record_entry_at(&txn, user_id, PointType::SubscriptionFee, SUBSCRIPTION_FEE, now).await?;

        let next_payment = today + Duration::days(SUBSCRIPTION_PERIOD_DAYS);
        let model = match existing {
            Some(sub) => {
                let mut am = sub.into_active_model();
                am.subscribe = Set(true);
                am.next_payment = Set(next_payment);
                am.last_renewed_on = Set(Some(today));
                am.updated_at = Set(now);
                am.update(&txn).await?
            }
            None => {
                subscriptions::ActiveModel {
                    user_id: Set(user_id),
                    subscribe: Set(true),
                    next_payment: Set(next_payment),
                    last_renewed_on: Set(Some(today)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        log::info!("User {user_id} subscribed until {next_payment}");
        Ok(model.into())
    }

    pub async fn cancel(&self, user_id: i64) -> AppResult<SubscriptionResponse> {
        let sub = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

        let mut am = sub.into_active_model();
        am.subscribe = Set(false);
        am.updated_at = Set(Utc::now());
        let model = am.update(&self.pool).await?;
        Ok(model.into())
    }

    /// 每日续费
    ///
    /// 1. 删除已过期仍标记为订阅中的记录（next_payment < today）
    /// 2. 今日到期：余额足够则扣费并顺延 28 天，否则取消订阅（保留记录）
    ///
    /// 顺延以 `next_payment = today` 为条件更新，重复执行同一天只会续费一次。
    pub async fn renew_subscription_batch(&self, today: NaiveDate) -> AppResult<RenewalReport> {
        let mut report = RenewalReport::default();

        let stale = subscriptions::Entity::delete_many()
            .filter(subscriptions::Column::Subscribe.eq(true))
            .filter(subscriptions::Column::NextPayment.lt(today))
            .exec(&self.pool)
            .await?;
        report.deleted = stale.rows_affected;

        let due = subscriptions::Entity::find()
            .filter(subscriptions::Column::Subscribe.eq(true))
            .filter(subscriptions::Column::NextPayment.eq(today))
            .order_by_asc(subscriptions::Column::Id)
            .all(&self.pool)
            .await?;

        let next_payment = today + Duration::days(SUBSCRIPTION_PERIOD_DAYS);
        for sub in due {
            let txn = self.pool.begin().await?;
            let now = Utc::now();
            let balance = net_balance_on(&txn, sub.user_id).await?;

            if balance >= SUBSCRIPTION_FEE {
                let advanced = subscriptions::Entity::update_many()
                    .col_expr(subscriptions::Column::NextPayment, Expr::value(next_payment))
                    .col_expr(subscriptions::Column::LastRenewedOn, Expr::value(Some(today)))
                    .col_expr(subscriptions::Column::UpdatedAt, Expr::value(now))
                    .filter(subscriptions::Column::Id.eq(sub.id))
                    .filter(subscriptions::Column::Subscribe.eq(true))
                    .filter(subscriptions::Column::NextPayment.eq(today))
                    .exec(&txn)
                    .await?;
                if advanced.rows_affected == 0 {
                    txn.rollback().await?;
                    continue;
                }
                record_entry_at(
                    &txn,
                    sub.user_id,
                    PointType::SubscriptionFee,
                    SUBSCRIPTION_FEE,
                    now,
                )
                .await?;
                txn.commit().await?;
                report.renewed += 1;
            } else {
                let lapsed = subscriptions::Entity::update_many()
                    .col_expr(subscriptions::Column::Subscribe, Expr::value(false))
                    .col_expr(subscriptions::Column::UpdatedAt, Expr::value(now))
                    .filter(subscriptions::Column::Id.eq(sub.id))
                    .filter(subscriptions::Column::Subscribe.eq(true))
                    .filter(subscriptions::Column::NextPayment.eq(today))
                    .exec(&txn)
                    .await?;
                txn.commit().await?;
                if lapsed.rows_affected > 0 {
                    log::info!("Subscription of user {} lapsed: balance {balance}", sub.user_id);
                }
                report.lapsed += lapsed.rows_affected;
            }
        }

        log::info!(
            "Subscription renewal {today}: renewed={} lapsed={} deleted={}",
            report.renewed,
            report.lapsed,
            report.deleted
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::services::point_service::record_entry;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn seed_subscription(
        db: &DatabaseConnection,
        user_id: i64,
        subscribe: bool,
        next_payment: NaiveDate,
    ) {
        let now = Utc::now();
        subscriptions::ActiveModel {
            user_id: Set(user_id),
            subscribe: Set(subscribe),
            next_payment: Set(next_payment),
            last_renewed_on: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_renews_exactly_once_with_exact_balance() {
        let db = memory_pool().await;
        let service = SubscriptionService::new(db.clone());
        let today = day("2025-03-01");
        record_entry(&db, 1, PointType::TopUp, SUBSCRIPTION_FEE).await.unwrap();
        seed_subscription(&db, 1, true, today).await;

        let first = service.renew_subscription_batch(today).await.unwrap();
        assert_eq!(first.renewed, 1);
        let second = service.renew_subscription_batch(today).await.unwrap();
        assert_eq!(second, RenewalReport::default());

        assert_eq!(net_balance_on(&db, 1).await.unwrap(), 0);
        let sub = service.get(1).await.unwrap();
        assert!(sub.subscribe);
        assert_eq!(sub.next_payment, day("2025-03-29"));
        assert_eq!(sub.last_renewed_on, Some(today));
    }

    #[tokio::test]
    async fn test_short_balance_lapses_and_keeps_record() {
        let db = memory_pool().await;
        let service = SubscriptionService::new(db.clone());
        let today = day("2025-03-01");
        record_entry(&db, 2, PointType::TopUp, SUBSCRIPTION_FEE - 1).await.unwrap();
        seed_subscription(&db, 2, true, today).await;

        let report = service.renew_subscription_batch(today).await.unwrap();
        assert_eq!(report.lapsed, 1);
        assert_eq!(report.renewed, 0);

        let sub = service.get(2).await.unwrap();
        assert!(!sub.subscribe);
        assert_eq!(sub.next_payment, today);
        assert_eq!(net_balance_on(&db, 2).await.unwrap(), SUBSCRIPTION_FEE - 1);
    }

    #[tokio::test]
    async fn test_stale_active_subscriptions_are_deleted() {
        let db = memory_pool().await;
        let service = SubscriptionService::new(db.clone());
        let today = day("2025-03-10");
        seed_subscription(&db, 3, true, day("2025-03-09")).await;
        seed_subscription(&db, 4, false, day("2025-03-01")).await;
        seed_subscription(&db, 5, true, day("2025-03-20")).await;

        let report = service.renew_subscription_batch(today).await.unwrap();
        assert_eq!(report.deleted, 1);
        assert!(service.get(3).await.is_err());
        assert!(service.get(4).await.is_ok());
        assert!(service.get(5).await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_and_cancel() {
        let db = memory_pool().await;
        let service = SubscriptionService::new(db.clone());
        let today = day("2025-04-01");

        let err = service.subscribe(6, today).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientPoints { .. }));

        record_entry(&db, 6, PointType::TopUp, 20_000).await.unwrap();
        let sub = service.subscribe(6, today).await.unwrap();
        assert_eq!(sub.next_payment, day("2025-04-29"));
        assert_eq!(net_balance_on(&db, 6).await.unwrap(), 20_000 - SUBSCRIPTION_FEE);
        assert!(matches!(
            service.subscribe(6, today).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        let cancelled = service.cancel(6).await.unwrap();
        assert!(!cancelled.subscribe);
        assert!(matches!(
            service.cancel(7).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
