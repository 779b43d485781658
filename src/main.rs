use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use choco_backend::{
    chat::{ChannelLayer, InMemoryChannelLayer},
    config::Config,
    database::{create_pool, run_migrations},
    external::{IamportClient, PaymentGateway},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::{FieldCipher, JwtService},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );
    let cipher = FieldCipher::new(&config.crypto.aes_key).expect("Invalid crypto.aes_key");

    // 外部支付网关
    let gateway: Arc<dyn PaymentGateway> = Arc::new(IamportClient::new(config.iamport.clone()));

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let user_service = UserService::new(pool.clone(), cipher.clone());
    let product_service = ProductService::new(pool.clone());
    let review_service = ReviewService::new(pool.clone());
    let cart_service = CartService::new(pool.clone());
    let bill_service = BillService::new(pool.clone(), cipher.clone());
    let order_service = OrderService::new(pool.clone());
    let point_service = PointService::new(pool.clone());
    let subscription_service = SubscriptionService::new(pool.clone());
    let payment_service = PaymentService::new(pool.clone(), gateway);
    let chat_service = ChatService::new(pool.clone());
    let sweep_service = SweepService::new(
        subscription_service.clone(),
        order_service.clone(),
        chat_service.clone(),
        user_service.clone(),
    );

    // 单进程内的聊天分组
    let layer: Arc<dyn ChannelLayer> = Arc::new(InMemoryChannelLayer::new());
    let layer = web::Data::from(layer);

    if config.scheduler.enabled {
        tasks::spawn_all(sweep_service.clone(), config.scheduler.interval_secs);
    } else {
        log::info!("In-process scheduler disabled; sweeps run only through the admin endpoint");
    }

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let allowed_origins = config.server.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&allowed_origins))
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(layer.clone())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(product_service.clone()))
            .app_data(web::Data::new(review_service.clone()))
            .app_data(web::Data::new(cart_service.clone()))
            .app_data(web::Data::new(bill_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(point_service.clone()))
            .app_data(web::Data::new(subscription_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(chat_service.clone()))
            .app_data(web::Data::new(sweep_service.clone()))
            .configure(swagger_config)
            .configure(handlers::ws_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::catalog_config)
                    .configure(handlers::cart_config)
                    .configure(handlers::bill_config)
                    .configure(handlers::order_config)
                    .configure(handlers::point_config)
                    .configure(handlers::subscription_config)
                    .configure(handlers::payment_config)
                    .configure(handlers::chat_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
