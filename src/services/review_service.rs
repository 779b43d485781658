use crate::entities::{
    PointType, bill_entity as bills, order_item_entity as order_items, product_entity as products,
    review_entity as reviews,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreateReviewRequest, ReviewResponse, UpdateReviewRequest};
use crate::services::point_service::record_entry;
use crate::utils::validate_star;
use chrono::Utc;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// 评价奖励：文字 1%，带图 5%（向上取整）
pub fn review_reward(price: i64, with_photo: bool) -> (PointType, i64) {
    if with_photo {
        (PointType::PhotoReview, (price * 5 + 99) / 100)
    } else {
        (PointType::TextReview, (price + 99) / 100)
    }
}

#[derive(Clone)]
pub struct ReviewService {
    pool: DatabaseConnection,
}

impl ReviewService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_for_product(&self, product_id: i64) -> AppResult<Vec<ReviewResponse>> {
        let list = reviews::Entity::find()
            .filter(reviews::Column::ProductId.eq(product_id))
            .order_by_desc(reviews::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn list_mine(&self, user_id: i64) -> AppResult<Vec<ReviewResponse>> {
        let list = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .order_by_desc(reviews::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 写评价并发放积分。一件商品只能评价一次，且必须买过。
    pub async fn create(
        &self,
        user_id: i64,
        product_id: i64,
        req: CreateReviewRequest,
    ) -> AppResult<ReviewResponse> {
        let product = products::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        validate_star(req.star)?;

        let reviewed = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .filter(reviews::Column::ProductId.eq(product_id))
            .count(&self.pool)
            .await?;
        if reviewed > 0 {
            return Err(AppError::NotAcceptable("Product already reviewed".to_string()));
        }

        let own_bills = Query::select()
            .column(bills::Column::Id)
            .from(bills::Entity)
            .and_where(bills::Column::UserId.eq(user_id))
            .to_owned();
        let bought = order_items::Entity::find()
            .filter(order_items::Column::ProductId.eq(product_id))
            .filter(order_items::Column::BillId.in_subquery(own_bills))
            .count(&self.pool)
            .await?;
        if bought == 0 {
            return Err(AppError::ValidationError("No purchase history".to_string()));
        }

        let image_url = req.image_url.filter(|u| !u.trim().is_empty());
        let (point_type, points) = review_reward(product.price, image_url.is_some());
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        let review = reviews::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            content: Set(req.content),
            star: Set(req.star),
            image_url: Set(image_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        record_entry(&txn, user_id, point_type, points).await?;
        txn.commit().await?;

        log::info!("User {user_id} reviewed product {product_id}, earned {points} points");
        Ok(review.into())
    }

    pub async fn update(
        &self,
        user_id: i64,
        product_id: i64,
        review_id: i64,
        req: UpdateReviewRequest,
    ) -> AppResult<ReviewResponse> {
        let review = reviews::Entity::find_by_id(review_id)
            .filter(reviews::Column::ProductId.eq(product_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
        if review.user_id != user_id {
            return Err(AppError::PermissionDenied);
        }

        let mut am = review.into_active_model();
        if let Some(star) = req.star {
            validate_star(star)?;
            am.star = Set(star);
        }
        if let Some(content) = req.content {
            am.content = Set(content);
        }
        if let Some(image_url) = req.image_url {
            am.image_url = Set(Some(image_url));
        }
        am.updated_at = Set(Utc::now());

        Ok(am.update(&self.pool).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::entities::OrderStatus;
    use crate::services::point_service::net_balance_on;
    use crate::services::test_support::*;

    fn text_review() -> CreateReviewRequest {
        CreateReviewRequest {
            content: "맛있어요".to_string(),
            star: 5,
            image_url: None,
        }
    }

    async fn seed_purchase(db: &DatabaseConnection, buyer_id: i64, product: &products::Model) {
        let bill = seed_bill(db, buyer_id).await;
        let now = Utc::now();
        order_items::ActiveModel {
            bill_id: Set(bill.id),
            product_id: Set(product.id),
            seller_id: Set(product.seller_id),
            name: Set(product.name.clone()),
            price: Set(product.price),
            amount: Set(1),
            order_status: Set(OrderStatus::Confirmed),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[test]
    fn test_reward_rounds_up() {
        assert_eq!(review_reward(1_000, false), (PointType::TextReview, 10));
        assert_eq!(review_reward(1_001, false), (PointType::TextReview, 11));
        assert_eq!(review_reward(1_000, true), (PointType::PhotoReview, 50));
        assert_eq!(review_reward(30, true), (PointType::PhotoReview, 2));
    }

    #[tokio::test]
    async fn test_review_requires_purchase_and_credits_once() {
        let db = memory_pool().await;
        let (_, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        let product = seed_product(&db, seller.id, "bar", 2_000, 5).await;
        let service = ReviewService::new(db.clone());

        let err = service.create(buyer.id, product.id, text_review()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        seed_purchase(&db, buyer.id, &product).await;
        service.create(buyer.id, product.id, text_review()).await.unwrap();
        assert_eq!(net_balance_on(&db, buyer.id).await.unwrap(), 20);

        let again = service.create(buyer.id, product.id, text_review()).await.unwrap_err();
        assert!(matches!(again, AppError::NotAcceptable(_)));
        assert_eq!(net_balance_on(&db, buyer.id).await.unwrap(), 20);
        assert_eq!(service.list_for_product(product.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_photo_review_and_owner_update() {
        let db = memory_pool().await;
        let (_, seller) = seed_seller(&db, "seller@choco.kr").await;
        let buyer = seed_user(&db, "buyer@choco.kr").await;
        let stranger = seed_user(&db, "stranger@choco.kr").await;
        let product = seed_product(&db, seller.id, "bar", 2_000, 5).await;
        seed_purchase(&db, buyer.id, &product).await;
        let service = ReviewService::new(db.clone());

        let review = service
            .create(
                buyer.id,
                product.id,
                CreateReviewRequest {
                    image_url: Some("https://img.choco.kr/1.png".to_string()),
                    ..text_review()
                },
            )
            .await
            .unwrap();
        assert_eq!(net_balance_on(&db, buyer.id).await.unwrap(), 100);

        let denied = service
            .update(stranger.id, product.id, review.id, UpdateReviewRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(denied, AppError::PermissionDenied));
        assert!(
            service
                .update(
                    buyer.id,
                    product.id,
                    review.id,
                    UpdateReviewRequest {
                        star: Some(9),
                        ..Default::default()
                    }
                )
                .await
                .is_err()
        );

        let updated = service
            .update(
                buyer.id,
                product.id,
                review.id,
                UpdateReviewRequest {
                    star: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.star, 3);
        assert_eq!(service.list_mine(buyer.id).await.unwrap().len(), 1);
    }
}
