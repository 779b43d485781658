use crate::entities::{cart_item_entity as cart_items, product_entity as products};
use crate::error::{AppError, AppResult};
use crate::models::CartItemResponse;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use std::collections::HashMap;

/// 单个购物车条目的数量上限
pub const MAX_CART_AMOUNT: i64 = 999;

fn check_amount(amount: i64) -> AppResult<()> {
    if !(1..=MAX_CART_AMOUNT).contains(&amount) {
        return Err(AppError::ValidationError(format!(
            "Amount must be between 1 and {MAX_CART_AMOUNT}"
        )));
    }
    Ok(())
}

fn line_total(price: i64, amount: i64) -> AppResult<i64> {
    price
        .checked_mul(amount)
        .ok_or_else(|| AppError::ValidationError("Cart total is too large".to_string()))
}

#[derive(Clone)]
pub struct CartService {
    pool: DatabaseConnection,
}

impl CartService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 购物车列表，`ids` 为空时返回全部
    pub async fn list(&self, user_id: i64, ids: Option<Vec<i64>>) -> AppResult<Vec<CartItemResponse>> {
        let mut query = cart_items::Entity::find().filter(cart_items::Column::UserId.eq(user_id));
        if let Some(ids) = ids {
            query = query.filter(cart_items::Column::Id.is_in(ids));
        }
        let lines = query
            .order_by_desc(cart_items::Column::UpdatedAt)
            .all(&self.pool)
            .await?;

        let product_ids: Vec<i64> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<i64, products::Model> = products::Entity::find()
            .filter(products::Column::Id.is_in(product_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        lines
            .into_iter()
            .filter_map(|line| products.get(&line.product_id).map(|p| (line, p)))
            .map(|(line, product)| {
                Ok(CartItemResponse {
                    id: line.id,
                    product_id: product.id,
                    product_name: product.name.clone(),
                    price: product.price,
                    amount: line.amount,
                    total_price: line_total(product.price, line.amount)?,
                })
            })
            .collect()
    }

    /// 加入购物车；同一商品已存在时合并数量
    pub async fn add(&self, user_id: i64, product_id: i64, amount: i64) -> AppResult<CartItemResponse> {
        check_amount(amount)?;

        let product = products::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        if !product.is_sellable() {
            return Err(AppError::InvalidProduct(product_id));
        }

        let now = Utc::now();
        let existing = cart_items::Entity::find()
            .filter(cart_items::Column::UserId.eq(user_id))
            .filter(cart_items::Column::ProductId.eq(product_id))
            .one(&self.pool)
            .await?;

        let line = match existing {
            Some(line) => {
                let merged = line
                    .amount
                    .checked_add(amount)
                    .ok_or_else(|| AppError::ValidationError("Amount is too large".to_string()))?;
                check_amount(merged)?;
                let mut am = line.into_active_model();
                am.amount = Set(merged);
                am.updated_at = Set(now);
                am.update(&self.pool).await?
            }
            None => {
                cart_items::ActiveModel {
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    amount: Set(amount),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?
            }
        };

        Ok(CartItemResponse {
            id: line.id,
            product_id,
            product_name: product.name,
            price: product.price,
            amount: line.amount,
            total_price: line_total(product.price, line.amount)?,
        })
    }

    pub async fn update_amount(&self, user_id: i64, cart_id: i64, amount: i64) -> AppResult<()> {
        check_amount(amount)?;

        let line = cart_items::Entity::find_by_id(cart_id)
            .filter(cart_items::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

        let mut am = line.into_active_model();
        am.amount = Set(amount);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;
        Ok(())
    }

    pub async fn delete(&self, user_id: i64, cart_ids: &[i64]) -> AppResult<u64> {
        if cart_ids.is_empty() {
            return Err(AppError::NoCartSelected);
        }

        let res = cart_items::Entity::delete_many()
            .filter(cart_items::Column::UserId.eq(user_id))
            .filter(cart_items::Column::Id.is_in(cart_ids.to_vec()))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::services::test_support::*;

    #[tokio::test]
    async fn test_add_merges_quantity() {
        let db = memory_pool().await;
        let (_, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        let product = seed_product(&db, seller.id, "bar", 1_000, 10).await;
        let service = CartService::new(db.clone());

        let first = service.add(buyer.id, product.id, 2).await.unwrap();
        let second = service.add(buyer.id, product.id, 3).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.amount, 5);
        assert_eq!(second.total_price, 5_000);

        let all = service.list(buyer.id, None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_can_be_restricted_and_is_per_user() {
        let db = memory_pool().await;
        let (_, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        let other = seed_user(&db, "other@choco.kr").await;
        let a = seed_product(&db, seller.id, "a", 100, 10).await;
        let b = seed_product(&db, seller.id, "b", 200, 10).await;
        let line_a = seed_cart(&db, buyer.id, a.id, 1).await;
        seed_cart(&db, buyer.id, b.id, 1).await;
        let foreign = seed_cart(&db, other.id, a.id, 1).await;
        let service = CartService::new(db.clone());

        let only_a = service.list(buyer.id, Some(vec![line_a.id, foreign.id])).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].product_id, a.id);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = memory_pool().await;
        let (_, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        let product = seed_product(&db, seller.id, "bar", 1_000, 10).await;
        let line = seed_cart(&db, buyer.id, product.id, 1).await;
        let service = CartService::new(db.clone());

        assert!(matches!(
            service.update_amount(buyer.id, line.id, 0).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
        assert!(matches!(
            service.update_amount(buyer.id + 100, line.id, 2).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        service.update_amount(buyer.id, line.id, 4).await.unwrap();
        assert_eq!(service.list(buyer.id, None).await.unwrap()[0].amount, 4);

        assert!(matches!(
            service.delete(buyer.id, &[]).await.unwrap_err(),
            AppError::NoCartSelected
        ));
        assert_eq!(service.delete(buyer.id, &[line.id]).await.unwrap(), 1);
        assert!(service.list(buyer.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_huge_amounts_are_rejected_without_overflow() {
        let db = memory_pool().await;
        let (_, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        let product = seed_product(&db, seller.id, "bar", 1_000, 10).await;
        let service = CartService::new(db.clone());

        assert!(matches!(
            service.add(buyer.id, product.id, i64::MAX / 2).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
        let line = service.add(buyer.id, product.id, MAX_CART_AMOUNT).await.unwrap();
        assert_eq!(line.total_price, 1_000 * MAX_CART_AMOUNT);

        // 合并后超过上限
        assert!(matches!(
            service.add(buyer.id, product.id, 1).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
        assert!(matches!(
            service.update_amount(buyer.id, line.id, i64::MAX).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
        assert_eq!(service.list(buyer.id, None).await.unwrap()[0].amount, MAX_CART_AMOUNT);
    }

    #[tokio::test]
    async fn test_cannot_add_deleted_product() {
        let db = memory_pool().await;
        let (_, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        let product = seed_product(&db, seller.id, "bar", 1_000, 10).await;
        let mut am = product.clone().into_active_model();
        am.item_state = Set(crate::entities::ItemState::Deleted);
        am.update(&db).await.unwrap();

        let err = CartService::new(db.clone())
            .add(buyer.id, product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidProduct(id) if id == product.id));
    }
}
