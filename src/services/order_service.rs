use crate::entities::{
    ItemState, OrderActor, OrderStatus, PointType, bill_entity as bills,
    cart_item_entity as cart_items, order_item_entity as order_items, product_entity as products,
    seller_entity as sellers,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CheckoutRequest, CheckoutResponse, OrderItemResponse, OrderQuery, PaginatedResponse,
    PaginationParams,
};
use crate::services::point_service::{net_balance_on, record_entry, record_entry_at};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use std::collections::HashMap;

/// 购买返现比例：1/20（向上取整）
const CASHBACK_DIVISOR: i64 = 20;
/// 已送达超过该天数的订单自动确认收货
pub const AUTO_CONFIRM_DAYS: i64 = 7;

pub fn cashback_for(total: i64) -> i64 {
    (total + CASHBACK_DIVISOR - 1) / CASHBACK_DIVISOR
}

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 结算：购物车 → 订单明细
    ///
    /// 全部步骤在同一事务中完成；余额不足、库存不足或商品不可售时回滚并删除该账单。
    pub async fn checkout(&self, user_id: i64, req: CheckoutRequest) -> AppResult<CheckoutResponse> {
        let bill_id = req.bill_id;

        let mut cart_ids = req.cart_ids;
        cart_ids.sort_unstable();
        cart_ids.dedup();

        let txn = self.pool.begin().await?;
        match self.checkout_in(&txn, user_id, bill_id, &cart_ids).await {
            Ok(resp) => {
                txn.commit().await?;
                log::info!(
                    "Checkout bill={bill_id} user={user_id} total={} items={}",
                    resp.total_price,
                    resp.items.len()
                );
                Ok(resp)
            }
            Err(e) => {
                txn.rollback().await?;
                if e.voids_bill() {
                    bills::Entity::delete_many()
                        .filter(bills::Column::Id.eq(bill_id))
                        .filter(bills::Column::UserId.eq(user_id))
                        .filter(bills::Column::IsPaid.eq(false))
                        .exec(&self.pool)
                        .await?;
                    log::warn!("Checkout bill={bill_id} user={user_id} voided: {e}");
                }
                Err(e)
            }
        }
    }

    async fn checkout_in(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        bill_id: i64,
        cart_ids: &[i64],
    ) -> AppResult<CheckoutResponse> {
        let bill = bills::Entity::find_by_id(bill_id)
            .filter(bills::Column::UserId.eq(user_id))
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Bill not found".to_string()))?;
        if bill.is_paid {
            return Err(AppError::BillAlreadyPaid(bill_id));
        }
        if cart_ids.is_empty() {
            return Err(AppError::NoCartSelected);
        }

        // 先占住账单：并发的第二次结算在这里失败
        let claimed = bills::Entity::update_many()
            .col_expr(bills::Column::IsPaid, Expr::value(true))
            .filter(bills::Column::Id.eq(bill_id))
            .filter(bills::Column::IsPaid.eq(false))
            .exec(txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::BillAlreadyPaid(bill_id));
        }

        let lines = cart_items::Entity::find()
            .filter(cart_items::Column::Id.is_in(cart_ids.to_vec()))
            .filter(cart_items::Column::UserId.eq(user_id))
            .order_by_asc(cart_items::Column::Id)
            .all(txn)
            .await?;
        if lines.len() != cart_ids.len() {
            return Err(AppError::NotFound("Cart item not found".to_string()));
        }

        let product_map: HashMap<i64, products::Model> = products::Entity::find()
            .filter(products::Column::Id.is_in(lines.iter().map(|l| l.product_id)))
            .all(txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut total: i64 = 0;
        for line in &lines {
            let product = product_map
                .get(&line.product_id)
                .filter(|p| p.is_sellable())
                .ok_or(AppError::InvalidProduct(line.product_id))?;
            let subtotal = product
                .price
                .checked_mul(line.amount)
                .ok_or_else(|| AppError::ValidationError("Order total overflow".to_string()))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| AppError::ValidationError("Order total overflow".to_string()))?;
        }

        let balance = net_balance_on(txn, user_id).await?;
        if balance < total {
            return Err(AppError::InsufficientPoints {
                balance,
                required: total,
            });
        }

        let cashback = cashback_for(total);
        record_entry(txn, user_id, PointType::Payment, total).await?;
        record_entry(txn, user_id, PointType::PurchaseCashback, cashback).await?;

        let now = Utc::now();
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = &product_map[&line.product_id];

            let decremented = products::Entity::update_many()
                .col_expr(
                    products::Column::Amount,
                    Expr::col(products::Column::Amount).sub(line.amount),
                )
                .col_expr(products::Column::UpdatedAt, Expr::value(now))
                .filter(products::Column::Id.eq(product.id))
                .filter(products::Column::Amount.gte(line.amount))
                .filter(products::Column::ItemState.eq(ItemState::OnSale))
                .exec(txn)
                .await?;
            if decremented.rows_affected == 0 {
                return Err(AppError::StockExceeded(product.id));
            }

            products::Entity::update_many()
                .col_expr(products::Column::ItemState, Expr::value(ItemState::SoldOut))
                .filter(products::Column::Id.eq(product.id))
                .filter(products::Column::Amount.eq(0))
                .filter(products::Column::ItemState.eq(ItemState::OnSale))
                .exec(txn)
                .await?;

            let item = order_items::ActiveModel {
                bill_id: Set(bill_id),
                product_id: Set(product.id),
                seller_id: Set(product.seller_id),
                name: Set(product.name.clone()),
                price: Set(product.price),
                amount: Set(line.amount),
                order_status: Set(OrderStatus::Confirmed),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            items.push(OrderItemResponse::from(item));
        }

        cart_items::Entity::delete_many()
            .filter(cart_items::Column::Id.is_in(cart_ids.to_vec()))
            .filter(cart_items::Column::UserId.eq(user_id))
            .exec(txn)
            .await?;

        Ok(CheckoutResponse {
            bill_id,
            total_price: total,
            cashback,
            items,
        })
    }

    /// 修改订单明细状态（买家或卖家）
    pub async fn change_status(
        &self,
        user_id: i64,
        item_id: i64,
        to: OrderStatus,
    ) -> AppResult<OrderItemResponse> {
        let txn = self.pool.begin().await?;

        let item = order_items::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Order item not found".to_string()))?;
        let parties = Parties::load(&txn, &item).await?;

        let is_buyer = parties.is_buyer(user_id);
        let is_seller = parties.is_seller(user_id);
        if !is_buyer && !is_seller {
            return Err(AppError::PermissionDenied);
        }

        let from = item.order_status;
        // 同一账户既是买家又是卖家时，任一身份允许即可
        let actor = if is_seller && from.can_transition(to, OrderActor::Seller) {
            OrderActor::Seller
        } else if is_buyer {
            OrderActor::Buyer
        } else {
            OrderActor::Seller
        };

        let updated = apply_transition(&txn, &item, &parties, to, actor, Utc::now()).await?;
        txn.commit().await?;

        log::info!("Order item {item_id}: {from} -> {to} by user {user_id}");
        Ok(updated.into())
    }

    /// 买家的订单明细
    pub async fn list_buyer_items(
        &self,
        user_id: i64,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderItemResponse>> {
        let own_bills = Query::select()
            .column(bills::Column::Id)
            .from(bills::Entity)
            .and_where(bills::Column::UserId.eq(user_id))
            .to_owned();
        let base = order_items::Entity::find()
            .filter(order_items::Column::BillId.in_subquery(own_bills));
        self.paginate(base, query).await
    }

    /// 卖家的订单明细
    pub async fn list_seller_items(
        &self,
        user_id: i64,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderItemResponse>> {
        let seller = sellers::Entity::find()
            .filter(sellers::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or(AppError::Forbidden)?;
        let base = order_items::Entity::find().filter(order_items::Column::SellerId.eq(seller.id));
        self.paginate(base, query).await
    }

    async fn paginate(
        &self,
        mut base: Select<order_items::Entity>,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderItemResponse>> {
        if let Some(status) = query.status {
            base = base.filter(order_items::Column::OrderStatus.eq(status));
        }
        let params = PaginationParams::new(query.page, query.page_size);

        let total = base.clone().count(&self.pool).await? as i64;
        let items = base
            .order_by_desc(order_items::Column::CreatedAt)
            .order_by_desc(order_items::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn item_detail(&self, user_id: i64, item_id: i64) -> AppResult<OrderItemResponse> {
        let item = order_items::Entity::find_by_id(item_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order item not found".to_string()))?;
        let parties = Parties::load(&self.pool, &item).await?;
        if !parties.is_buyer(user_id) && !parties.is_seller(user_id) {
            return Err(AppError::PermissionDenied);
        }
        Ok(item.into())
    }

    /// 自动确认收货：送达超过 7 天的明细转为 Completed 并结算给卖家
    pub async fn auto_confirm_batch(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::days(AUTO_CONFIRM_DAYS);
        let due = order_items::Entity::find()
            .filter(order_items::Column::OrderStatus.eq(OrderStatus::Delivered))
            .filter(order_items::Column::UpdatedAt.lte(cutoff))
            .order_by_asc(order_items::Column::Id)
            .all(&self.pool)
            .await?;

        let mut confirmed = 0u64;
        for item in due {
            let txn = self.pool.begin().await?;
            let result = match Parties::load(&txn, &item).await {
                Ok(parties) => {
                    apply_transition(
                        &txn,
                        &item,
                        &parties,
                        OrderStatus::Completed,
                        OrderActor::System,
                        now,
                    )
                    .await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(_) => {
                    txn.commit().await?;
                    confirmed += 1;
                }
                Err(AppError::Conflict(_)) => {
                    // 已被买家手动确认或状态已变化
                    txn.rollback().await?;
                }
                Err(e) => {
                    txn.rollback().await?;
                    log::error!("Auto confirm of order item {} failed: {e}", item.id);
                }
            }
        }

        if confirmed > 0 {
            log::info!("Auto-confirmed {confirmed} delivered order items");
        }
        Ok(confirmed)
    }
}

/// 订单明细对应的买家和卖家账户
struct Parties {
    buyer_id: i64,
    /// 卖家注销后为 `None`
    seller_user_id: Option<i64>,
}

impl Parties {
    async fn load<C: ConnectionTrait>(conn: &C, item: &order_items::Model) -> AppResult<Self> {
        let bill = bills::Entity::find_by_id(item.bill_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Bill not found".to_string()))?;
        let seller = sellers::Entity::find_by_id(item.seller_id).one(conn).await?;
        Ok(Self {
            buyer_id: bill.user_id,
            seller_user_id: seller.map(|s| s.user_id),
        })
    }

    fn is_buyer(&self, user_id: i64) -> bool {
        self.buyer_id == user_id
    }

    fn is_seller(&self, user_id: i64) -> bool {
        self.seller_user_id == Some(user_id)
    }
}

/// 校验状态边和操作方，CAS 更新状态，再写入该边对应的积分流水
async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    item: &order_items::Model,
    parties: &Parties,
    to: OrderStatus,
    actor: OrderActor,
    now: DateTime<Utc>,
) -> AppResult<order_items::Model> {
    let from = item.order_status;
    if from.edge_owner(to).is_none() {
        return Err(AppError::InvalidTransition { from, to });
    }
    if !from.can_transition(to, actor) {
        return Err(AppError::PermissionDenied);
    }

    let res = order_items::Entity::update_many()
        .col_expr(order_items::Column::OrderStatus, Expr::value(to))
        .col_expr(order_items::Column::UpdatedAt, Expr::value(now))
        .filter(order_items::Column::Id.eq(item.id))
        .filter(order_items::Column::OrderStatus.eq(from))
        .exec(conn)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "Order item {} is no longer {from}",
            item.id
        )));
    }

    let total = item.total_price();
    match (from, to) {
        (OrderStatus::Delivered, OrderStatus::Completed) => {
            let seller_user_id = parties
                .seller_user_id
                .ok_or_else(|| AppError::NotFound("Seller not found".to_string()))?;
            record_entry_at(conn, seller_user_id, PointType::Settlement, total, now).await?;
        }
        (OrderStatus::RefundRequested, OrderStatus::RefundCompleted)
        | (OrderStatus::Confirmed, OrderStatus::Cancelled) => {
            record_entry_at(conn, parties.buyer_id, PointType::Refund, total, now).await?;
        }
        _ => {}
    }

    Ok(order_items::Model {
        order_status: to,
        updated_at: now,
        ..item.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::services::test_support::*;
    use sea_orm::IntoActiveModel;

    struct Shop {
        db: DatabaseConnection,
        service: OrderService,
        buyer_id: i64,
        seller_user_id: i64,
        seller_id: i64,
    }

    async fn shop() -> Shop {
        let db = memory_pool().await;
        let (seller_user, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        Shop {
            service: OrderService::new(db.clone()),
            db,
            buyer_id: buyer.id,
            seller_user_id: seller_user.id,
            seller_id: seller.id,
        }
    }

    async fn bill_count(db: &DatabaseConnection, id: i64) -> u64 {
        bills::Entity::find_by_id(id).count(db).await.unwrap()
    }

    /// 买下一件商品，返回订单明细
    async fn bought_item(shop: &Shop, price: i64) -> OrderItemResponse {
        let product = seed_product(&shop.db, shop.seller_id, "choco", price, 10).await;
        record_entry(&shop.db, shop.buyer_id, PointType::TopUp, price).await.unwrap();
        let line = seed_cart(&shop.db, shop.buyer_id, product.id, 1).await;
        let bill = seed_bill(&shop.db, shop.buyer_id).await;
        let resp = shop
            .service
            .checkout(
                shop.buyer_id,
                CheckoutRequest {
                    bill_id: bill.id,
                    cart_ids: vec![line.id],
                },
            )
            .await
            .unwrap();
        resp.items.into_iter().next().unwrap()
    }

    async fn force_status(db: &DatabaseConnection, item_id: i64, status: OrderStatus) {
        let item = order_items::Entity::find_by_id(item_id).one(db).await.unwrap().unwrap();
        let mut am = item.into_active_model();
        am.order_status = Set(status);
        am.update(db).await.unwrap();
    }

    #[test]
    fn test_cashback_rounds_up() {
        assert_eq!(cashback_for(20), 1);
        assert_eq!(cashback_for(21), 2);
        assert_eq!(cashback_for(10_000), 500);
        assert_eq!(cashback_for(0), 0);
    }

    #[tokio::test]
    async fn test_checkout_happy_path() {
        let shop = shop().await;
        let a = seed_product(&shop.db, shop.seller_id, "a", 1_000, 5).await;
        let b = seed_product(&shop.db, shop.seller_id, "b", 500, 2).await;
        record_entry(&shop.db, shop.buyer_id, PointType::TopUp, 10_000).await.unwrap();
        let la = seed_cart(&shop.db, shop.buyer_id, a.id, 3).await;
        let lb = seed_cart(&shop.db, shop.buyer_id, b.id, 2).await;
        let bill = seed_bill(&shop.db, shop.buyer_id).await;

        let resp = shop
            .service
            .checkout(
                shop.buyer_id,
                CheckoutRequest {
                    bill_id: bill.id,
                    cart_ids: vec![la.id, lb.id],
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.total_price, 4_000);
        assert_eq!(resp.cashback, 200);
        assert_eq!(resp.items.len(), 2);
        assert!(resp.items.iter().all(|i| i.order_status == OrderStatus::Confirmed));
        assert_eq!(
            net_balance_on(&shop.db, shop.buyer_id).await.unwrap(),
            10_000 - 4_000 + 200
        );

        let a = products::Entity::find_by_id(a.id).one(&shop.db).await.unwrap().unwrap();
        let b = products::Entity::find_by_id(b.id).one(&shop.db).await.unwrap().unwrap();
        assert_eq!(a.amount, 2);
        assert_eq!(a.item_state, ItemState::OnSale);
        assert_eq!(b.amount, 0);
        assert_eq!(b.item_state, ItemState::SoldOut);

        let bill = bills::Entity::find_by_id(bill.id).one(&shop.db).await.unwrap().unwrap();
        assert!(bill.is_paid);
        assert_eq!(cart_items::Entity::find().count(&shop.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stock_exceeded_rolls_back_and_voids_bill() {
        let shop = shop().await;
        let product = seed_product(&shop.db, shop.seller_id, "bar", 100, 5).await;
        record_entry(&shop.db, shop.buyer_id, PointType::TopUp, 10_000).await.unwrap();
        let line = seed_cart(&shop.db, shop.buyer_id, product.id, 6).await;
        let bill = seed_bill(&shop.db, shop.buyer_id).await;

        let err = shop
            .service
            .checkout(
                shop.buyer_id,
                CheckoutRequest {
                    bill_id: bill.id,
                    cart_ids: vec![line.id],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StockExceeded(id) if id == product.id));

        let product = products::Entity::find_by_id(product.id).one(&shop.db).await.unwrap().unwrap();
        assert_eq!(product.amount, 5);
        assert_eq!(order_items::Entity::find().count(&shop.db).await.unwrap(), 0);
        assert_eq!(bill_count(&shop.db, bill.id).await, 0);
        assert_eq!(cart_items::Entity::find().count(&shop.db).await.unwrap(), 1);
        assert_eq!(net_balance_on(&shop.db, shop.buyer_id).await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn test_insufficient_points_voids_bill() {
        let shop = shop().await;
        let product = seed_product(&shop.db, shop.seller_id, "bar", 1_000, 5).await;
        record_entry(&shop.db, shop.buyer_id, PointType::TopUp, 999).await.unwrap();
        let line = seed_cart(&shop.db, shop.buyer_id, product.id, 1).await;
        let bill = seed_bill(&shop.db, shop.buyer_id).await;

        let err = shop
            .service
            .checkout(
                shop.buyer_id,
                CheckoutRequest {
                    bill_id: bill.id,
                    cart_ids: vec![line.id],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientPoints {
                balance: 999,
                required: 1_000
            }
        ));
        assert_eq!(bill_count(&shop.db, bill.id).await, 0);
    }

    #[tokio::test]
    async fn test_empty_selection_keeps_bill_and_paid_bill_is_rejected() {
        let shop = shop().await;
        let bill = seed_bill(&shop.db, shop.buyer_id).await;

        let err = shop
            .service
            .checkout(
                shop.buyer_id,
                CheckoutRequest {
                    bill_id: bill.id,
                    cart_ids: vec![],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoCartSelected));
        assert_eq!(bill_count(&shop.db, bill.id).await, 1);

        let item = bought_item(&shop, 100).await;
        let err = shop
            .service
            .checkout(
                shop.buyer_id,
                CheckoutRequest {
                    bill_id: item.bill_id,
                    cart_ids: vec![1],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BillAlreadyPaid(_)));
    }

    #[tokio::test]
    async fn test_foreign_cart_line_is_not_found() {
        let shop = shop().await;
        let other = seed_user(&shop.db, "other@choco.kr").await;
        let product = seed_product(&shop.db, shop.seller_id, "bar", 100, 5).await;
        let foreign = seed_cart(&shop.db, other.id, product.id, 1).await;
        let bill = seed_bill(&shop.db, shop.buyer_id).await;

        let err = shop
            .service
            .checkout(
                shop.buyer_id,
                CheckoutRequest {
                    bill_id: bill.id,
                    cart_ids: vec![foreign.id],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(bill_count(&shop.db, bill.id).await, 1);
    }

    #[tokio::test]
    async fn test_fulfilment_then_completion_settles_to_seller() {
        let shop = shop().await;
        let item = bought_item(&shop, 3_000).await;

        for to in [
            OrderStatus::Preparing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let updated = shop
                .service
                .change_status(shop.seller_user_id, item.id, to)
                .await
                .unwrap();
            assert_eq!(updated.order_status, to);
        }

        // 卖家不能替买家确认收货
        let err = shop
            .service
            .change_status(shop.seller_user_id, item.id, OrderStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));

        shop.service
            .change_status(shop.buyer_id, item.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            net_balance_on(&shop.db, shop.seller_user_id).await.unwrap(),
            3_000
        );
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_status_unchanged() {
        let shop = shop().await;
        let item = bought_item(&shop, 100).await;
        force_status(&shop.db, item.id, OrderStatus::Shipped).await;

        let err = shop
            .service
            .change_status(shop.seller_user_id, item.id, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Confirmed
            }
        ));
        let detail = shop.service.item_detail(shop.buyer_id, item.id).await.unwrap();
        assert_eq!(detail.order_status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_stranger_is_denied() {
        let shop = shop().await;
        let stranger = seed_user(&shop.db, "stranger@choco.kr").await;
        let item = bought_item(&shop, 100).await;

        let err = shop
            .service
            .change_status(stranger.id, item.id, OrderStatus::Preparing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
        assert!(matches!(
            shop.service.item_detail(stranger.id, item.id).await.unwrap_err(),
            AppError::PermissionDenied
        ));
    }

    #[tokio::test]
    async fn test_refund_flow_credits_buyer() {
        let shop = shop().await;
        let item = bought_item(&shop, 2_000).await;
        let before = net_balance_on(&shop.db, shop.buyer_id).await.unwrap();

        shop.service
            .change_status(shop.buyer_id, item.id, OrderStatus::RefundRequested)
            .await
            .unwrap();
        // 拒绝退款回到 Confirmed，再次申请后完成
        shop.service
            .change_status(shop.seller_user_id, item.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        shop.service
            .change_status(shop.buyer_id, item.id, OrderStatus::RefundRequested)
            .await
            .unwrap();
        shop.service
            .change_status(shop.seller_user_id, item.id, OrderStatus::RefundCompleted)
            .await
            .unwrap();

        assert_eq!(
            net_balance_on(&shop.db, shop.buyer_id).await.unwrap(),
            before + 2_000
        );
        let err = shop
            .service
            .change_status(shop.buyer_id, item.id, OrderStatus::RefundRequested)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_seller_cancel_refunds_buyer() {
        let shop = shop().await;
        let item = bought_item(&shop, 700).await;
        let before = net_balance_on(&shop.db, shop.buyer_id).await.unwrap();

        shop.service
            .change_status(shop.seller_user_id, item.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(
            net_balance_on(&shop.db, shop.buyer_id).await.unwrap(),
            before + 700
        );
    }

    #[tokio::test]
    async fn test_auto_confirm_only_old_deliveries_once() {
        let shop = shop().await;
        let old = bought_item(&shop, 1_000).await;
        let fresh = bought_item(&shop, 500).await;
        force_status(&shop.db, old.id, OrderStatus::Delivered).await;
        force_status(&shop.db, fresh.id, OrderStatus::Delivered).await;

        let later = Utc::now() + Duration::days(AUTO_CONFIRM_DAYS) + Duration::hours(1);
        // fresh 在 later 前一天才送达
        let item = order_items::Entity::find_by_id(fresh.id).one(&shop.db).await.unwrap().unwrap();
        let mut am = item.into_active_model();
        am.updated_at = Set(later - Duration::days(1));
        am.update(&shop.db).await.unwrap();

        assert_eq!(shop.service.auto_confirm_batch(later).await.unwrap(), 1);
        assert_eq!(shop.service.auto_confirm_batch(later).await.unwrap(), 0);

        let old = shop.service.item_detail(shop.buyer_id, old.id).await.unwrap();
        let fresh = shop.service.item_detail(shop.buyer_id, fresh.id).await.unwrap();
        assert_eq!(old.order_status, OrderStatus::Completed);
        assert_eq!(fresh.order_status, OrderStatus::Delivered);
        assert_eq!(
            net_balance_on(&shop.db, shop.seller_user_id).await.unwrap(),
            1_000
        );
    }

    #[tokio::test]
    async fn test_system_actor_only_auto_confirms() {
        let shop = shop().await;
        let item = bought_item(&shop, 400).await;
        let model = order_items::Entity::find_by_id(item.id).one(&shop.db).await.unwrap().unwrap();
        let parties = Parties::load(&shop.db, &model).await.unwrap();
        let now = Utc::now();

        // 定时任务不能替卖家取消订单
        let err = apply_transition(
            &shop.db,
            &model,
            &parties,
            OrderStatus::Cancelled,
            OrderActor::System,
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
        let err = apply_transition(
            &shop.db,
            &model,
            &parties,
            OrderStatus::Completed,
            OrderActor::System,
            now,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let detail = shop.service.item_detail(shop.buyer_id, item.id).await.unwrap();
        assert_eq!(detail.order_status, OrderStatus::Confirmed);
        let before = net_balance_on(&shop.db, shop.buyer_id).await.unwrap();

        force_status(&shop.db, item.id, OrderStatus::Delivered).await;
        let delivered = order_items::Entity::find_by_id(item.id).one(&shop.db).await.unwrap().unwrap();
        let done = apply_transition(
            &shop.db,
            &delivered,
            &parties,
            OrderStatus::Completed,
            OrderActor::System,
            now,
        )
        .await
        .unwrap();
        assert_eq!(done.order_status, OrderStatus::Completed);
        assert_eq!(done.updated_at, now);
        assert_eq!(net_balance_on(&shop.db, shop.buyer_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_listings_are_scoped() {
        let shop = shop().await;
        let item = bought_item(&shop, 100).await;
        bought_item(&shop, 200).await;
        force_status(&shop.db, item.id, OrderStatus::Preparing).await;

        let all = shop
            .service
            .list_buyer_items(shop.buyer_id, &OrderQuery::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let preparing = shop
            .service
            .list_seller_items(
                shop.seller_user_id,
                &OrderQuery {
                    status: Some(OrderStatus::Preparing),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(preparing.total, 1);
        assert_eq!(preparing.data[0].id, item.id);

        assert!(matches!(
            shop.service
                .list_seller_items(shop.buyer_id, &OrderQuery::default())
                .await
                .unwrap_err(),
            AppError::Forbidden
        ));
    }
}
