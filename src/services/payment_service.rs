use crate::entities::{PointType, payment_entity as payments};
use crate::error::{AppError, AppResult};
use crate::external::PaymentGateway;
use crate::models::{PaymentResponse, PrepareTopUpResponse};
use crate::services::point_service::record_entry;
use crate::utils::generate_merchant_uid;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;

/// 积分充值（通过支付网关）
#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(pool: DatabaseConnection, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// 创建待支付记录并向网关登记金额
    pub async fn prepare_top_up(&self, user_id: i64, amount: i64) -> AppResult<PrepareTopUpResponse> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Top-up amount must be positive".to_string(),
            ));
        }

        let merchant_uid = generate_merchant_uid(user_id);
        let now = Utc::now();
        let payment = payments::ActiveModel {
            user_id: Set(user_id),
            merchant_uid: Set(merchant_uid.clone()),
            imp_uid: Set(None),
            amount: Set(amount),
            status: Set(payments::STATUS_PENDING.to_string()),
            pay_method: Set(None),
            receipt_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        if let Err(e) = self.gateway.prepare(&merchant_uid, amount).await {
            // 网关登记失败的记录不会再被支付
            payments::Entity::update_many()
                .col_expr(payments::Column::Status, Expr::value(payments::STATUS_FAILED))
                .col_expr(payments::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(payments::Column::Id.eq(payment.id))
                .filter(payments::Column::Status.eq(payments::STATUS_PENDING))
                .exec(&self.pool)
                .await?;
            log::warn!("Top-up {merchant_uid} prepare failed: {e}");
            return Err(e);
        }

        Ok(PrepareTopUpResponse {
            merchant_uid,
            amount,
        })
    }

    /// 支付完成回调：核对网关交易后入账
    pub async fn complete_top_up(&self, user_id: i64, merchant_uid: &str) -> AppResult<PaymentResponse> {
        let payment = payments::Entity::find()
            .filter(payments::Column::MerchantUid.eq(merchant_uid))
            .filter(payments::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        if payment.status == payments::STATUS_PAID {
            return Ok(payment.into());
        }
        if payment.status == payments::STATUS_FAILED {
            return Err(AppError::ValidationError("Payment has failed".to_string()));
        }

        let tx = self.gateway.find_transaction(merchant_uid).await?;
        let now = Utc::now();

        if tx.amount != payment.amount {
            payments::Entity::update_many()
                .col_expr(payments::Column::Status, Expr::value(payments::STATUS_FAILED))
                .col_expr(payments::Column::ImpUid, Expr::value(Some(tx.imp_uid.clone())))
                .col_expr(payments::Column::UpdatedAt, Expr::value(now))
                .filter(payments::Column::Id.eq(payment.id))
                .filter(payments::Column::Status.eq(payments::STATUS_PENDING))
                .exec(&self.pool)
                .await?;
            log::warn!(
                "Top-up {merchant_uid} amount mismatch: expected {}, gateway {}",
                payment.amount,
                tx.amount
            );
            return Err(AppError::ValidationError(
                "Paid amount does not match".to_string(),
            ));
        }

        if tx.status != payments::STATUS_PAID {
            return Err(AppError::ValidationError(format!(
                "Payment is not completed: {}",
                tx.status
            )));
        }

        let txn = self.pool.begin().await?;
        let marked = payments::Entity::update_many()
            .col_expr(payments::Column::Status, Expr::value(payments::STATUS_PAID))
            .col_expr(payments::Column::ImpUid, Expr::value(Some(tx.imp_uid.clone())))
            .col_expr(payments::Column::PayMethod, Expr::value(tx.pay_method.clone()))
            .col_expr(payments::Column::ReceiptUrl, Expr::value(tx.receipt_url.clone()))
            .col_expr(payments::Column::UpdatedAt, Expr::value(now))
            .filter(payments::Column::Id.eq(payment.id))
            .filter(payments::Column::Status.eq(payments::STATUS_PENDING))
            .exec(&txn)
            .await?;
        if marked.rows_affected == 1 {
            record_entry(&txn, user_id, PointType::TopUp, payment.amount).await?;
            txn.commit().await?;
            log::info!("Top-up {merchant_uid} credited {} points", payment.amount);
        } else {
            // 并发请求已处理
            txn.rollback().await?;
        }

        let payment = payments::Entity::find_by_id(payment.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        if payment.status != payments::STATUS_PAID {
            return Err(AppError::ValidationError(format!(
                "Payment is {}",
                payment.status
            )));
        }
        Ok(payment.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::external::GatewayTransaction;
    use crate::services::point_service::net_balance_on;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录 prepare 调用，按预设返回交易
    #[derive(Default)]
    struct FakeGateway {
        prepared: Mutex<Vec<(String, i64)>>,
        paid_amount: Option<i64>,
        status: &'static str,
        reject_prepare: bool,
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn prepare(&self, merchant_uid: &str, amount: i64) -> AppResult<()> {
            if self.reject_prepare {
                return Err(AppError::ExternalApiError("iamport prepare failed".to_string()));
            }
            self.prepared
                .lock()
                .unwrap()
                .push((merchant_uid.to_string(), amount));
            Ok(())
        }

        async fn find_transaction(&self, merchant_uid: &str) -> AppResult<GatewayTransaction> {
            let amount = match self.paid_amount {
                Some(a) => a,
                None => self
                    .prepared
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|(uid, _)| uid == merchant_uid)
                    .map(|(_, a)| *a)
                    .unwrap_or_default(),
            };
            Ok(GatewayTransaction {
                imp_uid: "imp_1".to_string(),
                merchant_uid: merchant_uid.to_string(),
                amount,
                status: self.status.to_string(),
                pay_method: Some("card".to_string()),
                receipt_url: None,
            })
        }
    }

    fn service(db: &DatabaseConnection, gateway: FakeGateway) -> PaymentService {
        PaymentService::new(db.clone(), Arc::new(gateway))
    }

    #[tokio::test]
    async fn test_top_up_credits_once() {
        let db = memory_pool().await;
        let svc = service(
            &db,
            FakeGateway {
                status: "paid",
                ..Default::default()
            },
        );

        let prepared = svc.prepare_top_up(1, 10_000).await.unwrap();
        let paid = svc.complete_top_up(1, &prepared.merchant_uid).await.unwrap();
        assert_eq!(paid.status, "paid");
        assert_eq!(paid.imp_uid.as_deref(), Some("imp_1"));

        // 重复完成是幂等的
        svc.complete_top_up(1, &prepared.merchant_uid).await.unwrap();
        assert_eq!(net_balance_on(&db, 1).await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn test_amount_mismatch_marks_failed() {
        let db = memory_pool().await;
        let svc = service(
            &db,
            FakeGateway {
                status: "paid",
                paid_amount: Some(100),
                ..Default::default()
            },
        );

        let prepared = svc.prepare_top_up(2, 10_000).await.unwrap();
        let err = svc.complete_top_up(2, &prepared.merchant_uid).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let stored = payments::Entity::find()
            .filter(payments::Column::MerchantUid.eq(prepared.merchant_uid.as_str()))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, payments::STATUS_FAILED);
        assert_eq!(net_balance_on(&db, 2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unpaid_transaction_is_rejected() {
        let db = memory_pool().await;
        let svc = service(
            &db,
            FakeGateway {
                status: "ready",
                ..Default::default()
            },
        );

        let prepared = svc.prepare_top_up(3, 5_000).await.unwrap();
        assert!(svc.complete_top_up(3, &prepared.merchant_uid).await.is_err());
        assert!(matches!(
            svc.complete_top_up(4, &prepared.merchant_uid).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(svc.prepare_top_up(3, 0).await.is_err());
        assert_eq!(net_balance_on(&db, 3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prepare_failure_marks_payment_failed() {
        let db = memory_pool().await;
        let svc = service(
            &db,
            FakeGateway {
                status: "paid",
                reject_prepare: true,
                ..Default::default()
            },
        );

        let err = svc.prepare_top_up(5, 3_000).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));

        let stored = payments::Entity::find()
            .filter(payments::Column::UserId.eq(5))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, payments::STATUS_FAILED);

        // 失败的记录不能再入账
        assert!(svc.complete_top_up(5, &stored[0].merchant_uid).await.is_err());
        assert_eq!(net_balance_on(&db, 5).await.unwrap(), 0);
    }
}
