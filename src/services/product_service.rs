use crate::entities::{
    ItemState, category_entity as categories, product_entity as products, seller_entity as sellers,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::user_service::{approved_seller, require_admin};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// 商品在售状态由库存决定
fn state_for_stock(amount: i64) -> ItemState {
    if amount > 0 {
        ItemState::OnSale
    } else {
        ItemState::SoldOut
    }
}

fn check_product_fields(name: &str, price: i64, amount: i64) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::ValidationError("Product name is required".to_string()));
    }
    if price <= 0 {
        return Err(AppError::ValidationError("Price must be positive".to_string()));
    }
    if amount < 0 {
        return Err(AppError::ValidationError("Stock cannot be negative".to_string()));
    }
    Ok(())
}

/// 只写入请求里出现的字段。
///
/// 库存与在售状态可能已被结算改动，未修改库存时不能用 `snapshot` 的旧值覆盖。
async fn write_update<C: ConnectionTrait>(
    conn: &C,
    snapshot: products::Model,
    req: UpdateProductRequest,
) -> AppResult<products::Model> {
    check_product_fields(
        req.name.as_deref().unwrap_or(&snapshot.name),
        req.price.unwrap_or(snapshot.price),
        req.amount.unwrap_or(snapshot.amount),
    )?;

    let mut am = snapshot.into_active_model();
    if let Some(name) = req.name {
        am.name = Set(name.trim().to_string());
    }
    if let Some(price) = req.price {
        am.price = Set(price);
    }
    if let Some(amount) = req.amount {
        am.amount = Set(amount);
        am.item_state = Set(state_for_stock(amount));
    }
    if let Some(content) = req.content {
        am.content = Set(content);
    }
    if req.category_id.is_some() {
        am.category_id = Set(req.category_id);
    }
    am.updated_at = Set(Utc::now());
    Ok(am.update(conn).await?)
}

#[derive(Clone)]
pub struct ProductService {
    pool: DatabaseConnection,
}

impl ProductService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_categories(&self) -> AppResult<Vec<CategoryResponse>> {
        let list = categories::Entity::find()
            .order_by_asc(categories::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn create_category(&self, admin_id: i64, name: &str) -> AppResult<CategoryResponse> {
        require_admin(&self.pool, admin_id).await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("Category name is required".to_string()));
        }
        let exists = categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .count(&self.pool)
            .await?;
        if exists > 0 {
            return Err(AppError::Conflict(format!("Category {name} already exists")));
        }

        let category = categories::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(category.into())
    }

    /// 公开商品列表：仅在售商品
    pub async fn list_products(&self, query: &ProductQuery) -> AppResult<PaginatedResponse<ProductResponse>> {
        let mut select = products::Entity::find()
            .filter(products::Column::ItemState.eq(ItemState::OnSale));

        if let Some(user_id) = query.user_id {
            let seller = sellers::Entity::find()
                .filter(sellers::Column::UserId.eq(user_id))
                .one(&self.pool)
                .await?;
            match seller {
                Some(seller) => select = select.filter(products::Column::SellerId.eq(seller.id)),
                None => {
                    let params = PaginationParams::new(query.page, Some(self.page_size(query)));
                    return Ok(PaginatedResponse::new(Vec::new(), &params, 0));
                }
            }
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(products::Column::Name.contains(search))
                    .add(products::Column::Content.contains(search)),
            );
        }
        if let Some(category) = query.category {
            select = select.filter(products::Column::CategoryId.eq(category));
        }

        select = match query.ordering.unwrap_or(ProductOrdering::Recent) {
            ProductOrdering::Expensive => select.order_by_desc(products::Column::Price),
            ProductOrdering::Cheap => select.order_by_asc(products::Column::Price),
            ProductOrdering::Recent => select.order_by_desc(products::Column::CreatedAt),
        }
        .order_by_desc(products::Column::Id);

        let params = PaginationParams::new(query.page, Some(self.page_size(query)));
        let total = select.clone().count(&self.pool).await? as i64;
        let items = select
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

    fn page_size(&self, query: &ProductQuery) -> i64 {
        query.page_size.unwrap_or(PRODUCT_PAGE_SIZE)
    }

    /// 商品详情（已删除的商品不可见）
    pub async fn detail(&self, product_id: i64) -> AppResult<ProductResponse> {
        products::Entity::find_by_id(product_id)
            .filter(products::Column::ItemState.ne(ItemState::Deleted))
            .one(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    async fn ensure_category(&self, category_id: Option<i64>) -> AppResult<()> {
        if let Some(id) = category_id {
            categories::Entity::find_by_id(id)
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::ValidationError(format!("Unknown category {id}")))?;
        }
        Ok(())
    }

    pub async fn create(&self, user_id: i64, req: CreateProductRequest) -> AppResult<ProductResponse> {
        let seller = approved_seller(&self.pool, user_id).await?;
        check_product_fields(&req.name, req.price, req.amount)?;
        self.ensure_category(req.category_id).await?;

        let now = Utc::now();
        let product = products::ActiveModel {
            seller_id: Set(seller.id),
            category_id: Set(req.category_id),
            name: Set(req.name.trim().to_string()),
            content: Set(req.content),
            price: Set(req.price),
            amount: Set(req.amount),
            item_state: Set(state_for_stock(req.amount)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Seller {} listed product {}", seller.id, product.id);
        Ok(product.into())
    }

    async fn owned_product(&self, user_id: i64, product_id: i64) -> AppResult<products::Model> {
        let seller = approved_seller(&self.pool, user_id).await?;
        let product = products::Entity::find_by_id(product_id)
            .filter(products::Column::ItemState.ne(ItemState::Deleted))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        if product.seller_id != seller.id {
            return Err(AppError::PermissionDenied);
        }
        Ok(product)
    }

    pub async fn update(
        &self,
        user_id: i64,
        product_id: i64,
        req: UpdateProductRequest,
    ) -> AppResult<ProductResponse> {
        let product = self.owned_product(user_id, product_id).await?;
        if req.category_id.is_some() {
            self.ensure_category(req.category_id).await?;
        }
        Ok(write_update(&self.pool, product, req).await?.into())
    }

    /// 软删除：已有订单仍引用该商品
    pub async fn delete(&self, user_id: i64, product_id: i64) -> AppResult<()> {
        let product = self.owned_product(user_id, product_id).await?;
        let mut am = product.into_active_model();
        am.item_state = Set(ItemState::Deleted);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;
        log::info!("Product {product_id} deleted by user {user_id}");
        Ok(())
    }
}
