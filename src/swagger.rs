use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{ItemState, OrderStatus, PointType};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::verify,
        handlers::auth::resend_code,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::change_password,
        handlers::user::request_phone_code,
        handlers::user::verify_phone,
        handlers::user::apply_seller,
        handlers::user::get_seller,
        handlers::user::update_seller,
        handlers::user::withdraw_seller,
        handlers::user::list_deliveries,
        handlers::user::create_delivery,
        handlers::user::update_delivery,
        handlers::user::delete_delivery,
        handlers::catalog::list_categories,
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::list_reviews,
        handlers::catalog::create_review,
        handlers::catalog::update_review,
        handlers::catalog::my_reviews,
        handlers::cart::list_cart,
        handlers::cart::add_to_cart,
        handlers::cart::update_cart,
        handlers::cart::delete_cart,
        handlers::bill::create_bill,
        handlers::bill::list_bills,
        handlers::bill::get_bill,
        handlers::order::checkout,
        handlers::order::list_orders,
        handlers::order::list_seller_orders,
        handlers::order::get_order,
        handlers::order::change_status,
        handlers::point::get_balance,
        handlers::point::get_history,
        handlers::point::attend,
        handlers::subscription::get_subscription,
        handlers::subscription::subscribe,
        handlers::subscription::cancel_subscription,
        handlers::payment::prepare_top_up,
        handlers::payment::complete_top_up,
        handlers::chat::list_rooms,
        handlers::chat::create_room,
        handlers::chat::get_room,
        handlers::chat::delete_room,
        handlers::chat::room_messages,
        handlers::admin::run_all_sweeps,
        handlers::admin::run_sweep,
        handlers::admin::set_seller_approval,
        handlers::admin::create_category,
    ),
    components(
        schemas(
            ApiError,
            SignupRequest,
            VerifyEmailRequest,
            ResendCodeRequest,
            LoginRequest,
            RefreshTokenRequest,
            AuthResponse,
            UserResponse,
            UpdateUserRequest,
            ChangePasswordRequest,
            PhoneCodeRequest,
            VerifyPhoneRequest,
            ProfileResponse,
            SellerApplyRequest,
            UpdateSellerRequest,
            SellerResponse,
            SellerApprovalRequest,
            DeliveryRequest,
            DeliveryResponse,
            CategoryResponse,
            CreateCategoryRequest,
            ProductOrdering,
            CreateProductRequest,
            UpdateProductRequest,
            ProductResponse,
            ItemState,
            CreateReviewRequest,
            UpdateReviewRequest,
            ReviewResponse,
            AddCartRequest,
            UpdateCartRequest,
            DeleteCartRequest,
            CartItemResponse,
            CreateBillRequest,
            BillResponse,
            CheckoutRequest,
            CheckoutResponse,
            ChangeStatusRequest,
            OrderItemResponse,
            OrderStatus,
            BalanceResponse,
            PointEntryResponse,
            AttendanceResponse,
            PointType,
            SubscriptionResponse,
            PrepareTopUpRequest,
            PrepareTopUpResponse,
            CompleteTopUpRequest,
            PaymentResponse,
            CreateRoomRequest,
            RoomResponse,
            ParticipantResponse,
            RoomDetailResponse,
            MessageResponse,
            SweepReport,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, email verification and tokens"),
        (name = "user", description = "Profile and delivery addresses"),
        (name = "seller", description = "Seller application"),
        (name = "catalog", description = "Categories and products"),
        (name = "review", description = "Product reviews"),
        (name = "cart", description = "Shopping cart"),
        (name = "order", description = "Bills, checkout and order status"),
        (name = "point", description = "Point ledger and attendance"),
        (name = "subscription", description = "Monthly subscription"),
        (name = "payment", description = "Point top-up through the payment gateway"),
        (name = "chat", description = "Chat rooms"),
        (name = "admin", description = "Sweeps, seller approval and categories"),
    ),
    info(
        title = "Choco Backend API",
        version = "1.0.0",
        description = "Choco Backend REST API documentation. Chat sockets live under /ws and are not listed here."
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/orders/checkout"));
        assert!(doc.paths.paths.contains_key("/chat/rooms/{room_id}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
