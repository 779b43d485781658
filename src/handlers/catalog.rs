use crate::handlers::{created, current_user_id, success};
use crate::models::*;
use crate::services::{ProductService, ReviewService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    responses((status = 200, description = "分类列表", body = [CategoryResponse]))
)]
pub async fn list_categories(product_service: web::Data<ProductService>) -> Result<HttpResponse> {
    match product_service.list_categories().await {
        Ok(list) => Ok(success(list)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "catalog",
    params(ProductQuery),
    responses((status = 200, description = "在售商品列表"))
)]
pub async fn list_products(
    product_service: web::Data<ProductService>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse> {
    match product_service.list_products(&query.into_inner()).await {
        Ok(page) => Ok(success(page)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products/{product_id}",
    tag = "catalog",
    params(("product_id" = i64, Path, description = "商品 ID")),
    responses(
        (status = 200, description = "商品详情", body = ProductResponse),
        (status = 404, description = "商品不存在")
    )
)]
pub async fn get_product(
    product_service: web::Data<ProductService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match product_service.detail(path.into_inner()).await {
        Ok(product) => Ok(success(product)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "catalog",
    request_body = CreateProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "商品已上架", body = ProductResponse),
        (status = 403, description = "不是已审核的卖家")
    )
)]
pub async fn create_product(
    product_service: web::Data<ProductService>,
    req: HttpRequest,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match product_service.create(user_id, request.into_inner()).await {
        Ok(product) => Ok(created(product)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/products/{product_id}",
    tag = "catalog",
    request_body = UpdateProductRequest,
    params(("product_id" = i64, Path, description = "商品 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "商品已更新", body = ProductResponse),
        (status = 403, description = "不是该商品的卖家")
    )
)]
pub async fn update_product(
    product_service: web::Data<ProductService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match product_service
        .update(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(product) => Ok(success(product)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/products/{product_id}",
    tag = "catalog",
    params(("product_id" = i64, Path, description = "商品 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "商品已下架"),
        (status = 403, description = "不是该商品的卖家")
    )
)]
pub async fn delete_product(
    product_service: web::Data<ProductService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match product_service.delete(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/products/{product_id}/reviews",
    tag = "review",
    params(("product_id" = i64, Path, description = "商品 ID")),
    responses((status = 200, description = "商品评价", body = [ReviewResponse]))
)]
pub async fn list_reviews(
    review_service: web::Data<ReviewService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match review_service.list_for_product(path.into_inner()).await {
        Ok(list) => Ok(success(list)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/products/{product_id}/reviews",
    tag = "review",
    request_body = CreateReviewRequest,
    params(("product_id" = i64, Path, description = "商品 ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "评价成功并发放积分", body = ReviewResponse),
        (status = 400, description = "没有购买记录"),
        (status = 406, description = "已评价过")
    )
)]
pub async fn create_review(
    review_service: web::Data<ReviewService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match review_service
        .create(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(review) => Ok(created(review)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/products/{product_id}/reviews/{review_id}",
    tag = "review",
    request_body = UpdateReviewRequest,
    params(
        ("product_id" = i64, Path, description = "商品 ID"),
        ("review_id" = i64, Path, description = "评价 ID")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "评价已更新", body = ReviewResponse),
        (status = 403, description = "不是自己的评价")
    )
)]
pub async fn update_review(
    review_service: web::Data<ReviewService>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    request: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let (product_id, review_id) = path.into_inner();
    match review_service
        .update(user_id, product_id, review_id, request.into_inner())
        .await
    {
        Ok(review) => Ok(success(review)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/reviews/me",
    tag = "review",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "我的评价", body = [ReviewResponse]))
)]
pub async fn my_reviews(
    review_service: web::Data<ReviewService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    match review_service.list_mine(user_id).await {
        Ok(list) => Ok(success(list)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/categories", web::get().to(list_categories))
        .route("/reviews/me", web::get().to(my_reviews))
        .service(
            web::scope("/products")
                .route("", web::get().to(list_products))
                .route("", web::post().to(create_product))
                .route("/{product_id}", web::get().to(get_product))
                .route("/{product_id}", web::put().to(update_product))
                .route("/{product_id}", web::delete().to(delete_product))
                .route("/{product_id}/reviews", web::get().to(list_reviews))
                .route("/{product_id}/reviews", web::post().to(create_review))
                .route(
                    "/{product_id}/reviews/{review_id}",
                    web::put().to(update_review),
                ),
        );
}
