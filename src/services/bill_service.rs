use crate::entities::{
    bill_entity as bills, delivery_entity as deliveries, order_item_entity as order_items,
};
use crate::error::{AppError, AppResult};
use crate::models::{BillResponse, CreateBillRequest};
use crate::utils::{FieldCipher, validate_address, validate_postal_code};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone)]
pub struct BillService {
    pool: DatabaseConnection,
    cipher: FieldCipher,
}

impl BillService {
    pub fn new(pool: DatabaseConnection, cipher: FieldCipher) -> Self {
        Self { pool, cipher }
    }

    fn to_response(&self, bill: bills::Model) -> AppResult<BillResponse> {
        Ok(BillResponse {
            id: bill.id,
            address: self.cipher.open(&bill.address)?,
            detail_address: self.cipher.open(&bill.detail_address)?,
            recipient: self.cipher.open(&bill.recipient)?,
            postal_code: self.cipher.open(&bill.postal_code)?,
            is_paid: bill.is_paid,
            created_at: bill.created_at,
            items: None,
        })
    }

    /// 创建订单：使用已保存的配送信息，或直接填写地址
    pub async fn create(&self, user_id: i64, req: CreateBillRequest) -> AppResult<BillResponse> {
        let mut am = bills::ActiveModel {
            user_id: Set(user_id),
            is_paid: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Some(delivery_id) = req.delivery_id {
            let delivery = deliveries::Entity::find_by_id(delivery_id)
                .filter(deliveries::Column::UserId.eq(user_id))
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))?;
            // 密文直接复制，无需解密
            am.address = Set(delivery.address);
            am.detail_address = Set(delivery.detail_address);
            am.recipient = Set(delivery.recipient);
            am.postal_code = Set(delivery.postal_code);
        } else {
            let address = req.address.unwrap_or_default();
            let recipient = req.recipient.unwrap_or_default();
            let postal_code = req.postal_code.unwrap_or_default();
            validate_address(&address, &recipient)?;
            validate_postal_code(&postal_code)?;

            am.address = Set(self.cipher.seal(&address)?);
            am.detail_address = Set(self.cipher.seal(&req.detail_address.unwrap_or_default())?);
            am.recipient = Set(self.cipher.seal(&recipient)?);
            am.postal_code = Set(self.cipher.seal(&postal_code)?);
        }

        let bill = am.insert(&self.pool).await?;
        log::info!("Bill {} created for user {user_id}", bill.id);
        self.to_response(bill)
    }

    pub async fn list(&self, user_id: i64) -> AppResult<Vec<BillResponse>> {
        let list = bills::Entity::find()
            .filter(bills::Column::UserId.eq(user_id))
            .order_by_desc(bills::Column::CreatedAt)
            .order_by_desc(bills::Column::Id)
            .all(&self.pool)
            .await?;
        list.into_iter().map(|b| self.to_response(b)).collect()
    }

    pub async fn detail(&self, user_id: i64, bill_id: i64) -> AppResult<BillResponse> {
        let bill = bills::Entity::find_by_id(bill_id)
            .filter(bills::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Bill not found".to_string()))?;

        let items = order_items::Entity::find()
            .filter(order_items::Column::BillId.eq(bill.id))
            .order_by_asc(order_items::Column::Id)
            .all(&self.pool)
            .await?;

        let mut resp = self.to_response(bill)?;
        resp.items = Some(items.into_iter().map(Into::into).collect());
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::services::test_support::*;

    fn inline_request() -> CreateBillRequest {
        CreateBillRequest {
            delivery_id: None,
            address: Some("서울특별시 강남구 테헤란로 1".to_string()),
            detail_address: Some("3층".to_string()),
            recipient: Some("홍길동".to_string()),
            postal_code: Some("06236".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_bill_encrypts_address_at_rest() {
        let db = memory_pool().await;
        let user = seed_user(&db, "buyer@choco.kr").await;
        let service = BillService::new(db.clone(), cipher());

        let bill = service.create(user.id, inline_request()).await.unwrap();
        assert_eq!(bill.address, "서울특별시 강남구 테헤란로 1");
        assert!(!bill.is_paid);

        let stored = bills::Entity::find_by_id(bill.id).one(&db).await.unwrap().unwrap();
        assert_ne!(stored.address.0, bill.address);
        assert_eq!(cipher().open(&stored.recipient).unwrap(), "홍길동");
    }

    #[tokio::test]
    async fn test_create_bill_validates_inline_address() {
        let db = memory_pool().await;
        let user = seed_user(&db, "buyer@choco.kr").await;
        let service = BillService::new(db.clone(), cipher());

        let mut req = inline_request();
        req.postal_code = Some("123".to_string());
        assert!(matches!(
            service.create(user.id, req).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn test_other_users_bill_is_not_found() {
        let db = memory_pool().await;
        let owner = seed_user(&db, "owner@choco.kr").await;
        let other = seed_user(&db, "other@choco.kr").await;
        let service = BillService::new(db.clone(), cipher());
        let bill = service.create(owner.id, inline_request()).await.unwrap();

        assert!(matches!(
            service.detail(other.id, bill.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        let detail = service.detail(owner.id, bill.id).await.unwrap();
        assert_eq!(detail.items.map(|i| i.len()), Some(0));
        assert_eq!(service.list(owner.id).await.unwrap().len(), 1);
        assert!(service.list(other.id).await.unwrap().is_empty());
    }
}
