//! Fixtures shared by the service tests.

use crate::entities::{
    ItemState, bill_entity as bills, cart_item_entity as cart_items, product_entity as products,
    seller_entity as sellers, user_entity as users,
};
use crate::utils::{FieldCipher, hash_password};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub const TEST_AES_KEY: &str = "0123456789abcdef0123456789abcdef";
pub const TEST_PASSWORD: &str = "choco12!";

pub fn cipher() -> FieldCipher {
    FieldCipher::new(TEST_AES_KEY).unwrap()
}

pub async fn seed_user(db: &DatabaseConnection, email: &str) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        email: Set(email.to_string()),
        nickname: Set(email.split('@').next().unwrap_or("user").to_string()),
        password_hash: Set(hash_password(TEST_PASSWORD).unwrap()),
        auth_code: Set(None),
        login_attempts_count: Set(0),
        is_active: Set(true),
        is_seller: Set(false),
        is_admin: Set(false),
        phone_number: Set(Some("01012345678".to_string())),
        phone_verified: Set(true),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// Approved seller profile for a fresh user.
pub async fn seed_seller(db: &DatabaseConnection, email: &str) -> (users::Model, sellers::Model) {
    let user = seed_user(db, email).await;
    let mut am: users::ActiveModel = user.clone().into();
    am.is_seller = Set(true);
    let user = am.update(db).await.unwrap();

    let cipher = cipher();
    let now = Utc::now();
    let seller = sellers::ActiveModel {
        user_id: Set(user.id),
        company_name: Set("Choco Co".to_string()),
        business_number: Set("123-45-67890".to_string()),
        business_owner_name: Set("Kim".to_string()),
        contact_number: Set("01012345678".to_string()),
        bank_name: Set(cipher.seal("Choco Bank").unwrap()),
        account_number: Set(cipher.seal("110-222-333333").unwrap()),
        account_holder: Set(cipher.seal("Kim").unwrap()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    (user, seller)
}

pub async fn seed_product(
    db: &DatabaseConnection,
    seller_id: i64,
    name: &str,
    price: i64,
    amount: i64,
) -> products::Model {
    let now = Utc::now();
    products::ActiveModel {
        seller_id: Set(seller_id),
        category_id: Set(None),
        name: Set(name.to_string()),
        content: Set(format!("{name} description")),
        price: Set(price),
        amount: Set(amount),
        item_state: Set(ItemState::OnSale),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_bill(db: &DatabaseConnection, user_id: i64) -> bills::Model {
    let cipher = cipher();
    bills::ActiveModel {
        user_id: Set(user_id),
        address: Set(cipher.seal("서울시 강남구").unwrap()),
        detail_address: Set(cipher.seal("101호").unwrap()),
        recipient: Set(cipher.seal("홍길동").unwrap()),
        postal_code: Set(cipher.seal("06236").unwrap()),
        is_paid: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_cart(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    amount: i64,
) -> cart_items::Model {
    let now = Utc::now();
    cart_items::ActiveModel {
        user_id: Set(user_id),
        product_id: Set(product_id),
        amount: Set(amount),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
