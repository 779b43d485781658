use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter, Iterable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 订单商品状态，按数字编码存储
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(num_value = 1)]
    PendingPayment,
    #[sea_orm(num_value = 2)]
    Confirmed,
    #[sea_orm(num_value = 3)]
    Preparing,
    #[sea_orm(num_value = 4)]
    Shipped,
    #[sea_orm(num_value = 5)]
    Delivered,
    #[sea_orm(num_value = 6)]
    Completed,
    #[sea_orm(num_value = 7)]
    Cancelled,
    #[sea_orm(num_value = 8)]
    RefundRequested,
    #[sea_orm(num_value = 9)]
    RefundCompleted,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::RefundRequested => "refund_requested",
            OrderStatus::RefundCompleted => "refund_completed",
        };
        write!(f, "{s}")
    }
}

/// 状态变更的发起方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActor {
    Buyer,
    Seller,
    /// 结算流程和定时任务
    System,
}

impl OrderStatus {
    /// `self -> to` 这条边归谁操作，边不存在时为 `None`
    pub fn edge_owner(self, to: OrderStatus) -> Option<OrderActor> {
        use OrderStatus::*;
        match (self, to) {
            (PendingPayment, Confirmed) => Some(OrderActor::System),
            (PendingPayment, Cancelled) => Some(OrderActor::Buyer),
            (Confirmed, Preparing) | (Preparing, Shipped) | (Shipped, Delivered) => {
                Some(OrderActor::Seller)
            }
            (Confirmed, Cancelled) => Some(OrderActor::Seller),
            (Delivered, Completed) => Some(OrderActor::Buyer),
            (Confirmed | Preparing | Shipped | Delivered, RefundRequested) => {
                Some(OrderActor::Buyer)
            }
            (RefundRequested, Confirmed) | (RefundRequested, RefundCompleted) => {
                Some(OrderActor::Seller)
            }
            _ => None,
        }
    }

    /// `actor` 能否把状态从 `self` 改为 `to`。
    ///
    /// 系统另外可以自动确认已送达的订单。
    pub fn can_transition(self, to: OrderStatus, actor: OrderActor) -> bool {
        match self.edge_owner(to) {
            Some(owner) if owner == actor => true,
            Some(OrderActor::Buyer) => {
                actor == OrderActor::System
                    && self == OrderStatus::Delivered
                    && to == OrderStatus::Completed
            }
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::RefundCompleted
        )
    }

    /// 所有终态，供查询过滤使用
    pub fn terminal_states() -> Vec<OrderStatus> {
        OrderStatus::iter().filter(|s| s.is_terminal()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bill_id: i64,
    pub product_id: i64,
    /// 下单时的 sellers.id
    pub seller_id: i64,
    pub name: String,
    pub price: i64,
    pub amount: i64,
    pub order_status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn total_price(&self) -> i64 {
        self.price * self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seller_drives_fulfilment() {
        use OrderStatus::*;
        assert!(Confirmed.can_transition(Preparing, OrderActor::Seller));
        assert!(Preparing.can_transition(Shipped, OrderActor::Seller));
        assert!(Shipped.can_transition(Delivered, OrderActor::Seller));
        assert!(Confirmed.can_transition(Cancelled, OrderActor::Seller));
        assert!(!Confirmed.can_transition(Preparing, OrderActor::Buyer));
        assert!(!Delivered.can_transition(Completed, OrderActor::Seller));
    }

    #[test]
    fn test_buyer_completes_or_requests_refund() {
        use OrderStatus::*;
        assert!(Delivered.can_transition(Completed, OrderActor::Buyer));
        for from in [Confirmed, Preparing, Shipped, Delivered] {
            assert!(from.can_transition(RefundRequested, OrderActor::Buyer));
            assert!(!from.can_transition(RefundRequested, OrderActor::Seller));
        }
        assert!(!Completed.can_transition(RefundRequested, OrderActor::Buyer));
    }

    #[test]
    fn test_refund_rollback_is_the_only_backward_edge() {
        use OrderStatus::*;
        assert!(RefundRequested.can_transition(Confirmed, OrderActor::Seller));
        assert!(RefundRequested.can_transition(RefundCompleted, OrderActor::Seller));
        assert!(!Shipped.can_transition(Preparing, OrderActor::Seller));
        assert!(!Completed.can_transition(Delivered, OrderActor::Buyer));
        assert_eq!(Delivered.edge_owner(Shipped), None);
    }

    #[test]
    fn test_terminal_states_have_no_outgoing_edges() {
        for from in OrderStatus::iter().filter(|s| s.is_terminal()) {
            for to in OrderStatus::iter() {
                assert_eq!(from.edge_owner(to), None, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_system_edges() {
        use OrderStatus::*;
        assert!(PendingPayment.can_transition(Confirmed, OrderActor::System));
        assert!(!PendingPayment.can_transition(Confirmed, OrderActor::Seller));
        assert!(Delivered.can_transition(Completed, OrderActor::System));
        assert!(!Confirmed.can_transition(Cancelled, OrderActor::System));
    }

    #[test]
    fn test_terminal_states_list() {
        use OrderStatus::*;
        assert_eq!(
            OrderStatus::terminal_states(),
            vec![Completed, Cancelled, RefundCompleted]
        );
    }

    #[test]
    fn test_status_codes_match_storage() {
        assert_eq!(OrderStatus::PendingPayment.to_value(), 1);
        assert_eq!(OrderStatus::Completed.to_value(), 6);
        assert_eq!(OrderStatus::RefundCompleted.to_value(), 9);
    }
}
