//! 后台定时任务。
//!
//! 启动时调用一次 `spawn_all`：订阅续费、订单自动确认、聊天记录清理和账号整理
//! 按同一个间隔依次执行，管理员接口 `POST /api/v1/admin/sweeps` 走的是同一套逻辑。

use crate::services::SweepService;
use chrono::Utc;

pub fn spawn_all(sweep_service: SweepService, interval_secs: u64) {
    let interval = std::time::Duration::from_secs(interval_secs.max(1));
    tokio::spawn(async move {
        loop {
            match sweep_service.run_all(Utc::now()).await {
                Ok(report) => log::info!(
                    "Sweeps finished: renewed={} lapsed={} removed_subscriptions={} auto_confirmed={} purged_messages={} deleted_accounts={} deactivated_accounts={}",
                    report.subscriptions_renewed,
                    report.subscriptions_lapsed,
                    report.subscriptions_deleted,
                    report.orders_auto_confirmed,
                    report.messages_purged,
                    report.accounts_deleted,
                    report.accounts_deactivated,
                ),
                Err(e) => log::error!("Failed to run sweeps: {e:?}"),
            }
            tokio::time::sleep(interval).await;
        }
    });
}
