use crate::error::AppResult;
use crate::models::SweepReport;
use crate::services::{ChatService, OrderService, SubscriptionService, UserService};
use chrono::{DateTime, Utc};

/// 定时清理任务的统一入口（调度器与管理员接口共用）
#[derive(Clone)]
pub struct SweepService {
    subscriptions: SubscriptionService,
    orders: OrderService,
    chat: ChatService,
    users: UserService,
}

impl SweepService {
    pub fn new(
        subscriptions: SubscriptionService,
        orders: OrderService,
        chat: ChatService,
        users: UserService,
    ) -> Self {
        Self {
            subscriptions,
            orders,
            chat,
            users,
        }
    }

    pub async fn renew_subscriptions(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let renewal = self
            .subscriptions
            .renew_subscription_batch(now.date_naive())
            .await?;
        Ok(SweepReport {
            subscriptions_deleted: renewal.deleted,
            subscriptions_renewed: renewal.renewed,
            subscriptions_lapsed: renewal.lapsed,
            ..Default::default()
        })
    }

    pub async fn auto_confirm_orders(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        Ok(SweepReport {
            orders_auto_confirmed: self.orders.auto_confirm_batch(now).await?,
            ..Default::default()
        })
    }

    pub async fn purge_chat_logs(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        Ok(SweepReport {
            messages_purged: self.chat.purge_old_messages(now).await?,
            ..Default::default()
        })
    }

    pub async fn account_housekeeping(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let report = self.users.housekeeping(now).await?;
        Ok(SweepReport {
            accounts_deleted: report.deleted,
            accounts_deactivated: report.deactivated,
            ..Default::default()
        })
    }

    /// 依次执行全部清理任务；任一失败即返回错误，已完成的部分不回滚
    pub async fn run_all(&self, now: DateTime<Utc>) -> AppResult<SweepReport> {
        let renewal = self.renew_subscriptions(now).await?;
        let orders = self.auto_confirm_orders(now).await?;
        let chat = self.purge_chat_logs(now).await?;
        let accounts = self.account_housekeeping(now).await?;

        Ok(SweepReport {
            orders_auto_confirmed: orders.orders_auto_confirmed,
            messages_purged: chat.messages_purged,
            accounts_deleted: accounts.accounts_deleted,
            accounts_deactivated: accounts.accounts_deactivated,
            ..renewal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::services::test_support::*;
    use sea_orm::DatabaseConnection;

    fn sweeps(db: &DatabaseConnection) -> SweepService {
        SweepService::new(
            SubscriptionService::new(db.clone()),
            OrderService::new(db.clone()),
            ChatService::new(db.clone()),
            UserService::new(db.clone(), cipher()),
        )
    }

    #[tokio::test]
    async fn test_run_all_is_idempotent_on_empty_state() {
        let db = memory_pool().await;
        seed_user(&db, "fresh@choco.kr").await;
        let sweeps = sweeps(&db);

        let now = Utc::now();
        assert_eq!(sweeps.run_all(now).await.unwrap(), SweepReport::default());
        assert_eq!(sweeps.run_all(now).await.unwrap(), SweepReport::default());
    }

    #[tokio::test]
    async fn test_run_all_collects_every_sweep() {
        let db = memory_pool().await;
        let author = seed_user(&db, "author@choco.kr").await;
        let chat = ChatService::new(db.clone());
        let room = chat
            .create_room(
                author.id,
                crate::models::CreateRoomRequest {
                    name: "lobby".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();
        chat.post_message(room.id, author.id, "hi").await.unwrap();

        let later = Utc::now() + chrono::Duration::days(31);
        let report = sweeps(&db).run_all(later).await.unwrap();
        assert_eq!(report.messages_purged, 1);
        assert_eq!(report.accounts_deactivated, 1);
        assert_eq!(report.subscriptions_renewed, 0);
    }
}
