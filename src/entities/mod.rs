pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod shipping_address;
pub mod user;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Schema, Set,
    TransactionTrait,
};
use std::sync::Arc;

use crate::entities::{
    order::Entity as Order, order_item::Entity as OrderItem, product::Entity as Product,
    review::Entity as Review, shipping_address::Entity as ShippingAddress,
    user::Entity as User,
};

pub async fn setup_schema(db: &DatabaseConnection) {
    let schema = Schema::new(db.get_database_backend());
    let create_user_table = schema.create_table_from_entity(User);
    let create_product_table = schema.create_table_from_entity(Product);
    let create_review_table = schema.create_table_from_entity(Review);
    let create_order_table = schema.create_table_from_entity(Order);
    let create_order_item_table = schema.create_table_from_entity(OrderItem);
    let create_shipping_address_table = schema.create_table_from_entity(ShippingAddress);

    db.execute(db.get_database_backend().build(&create_user_table))
        .await
        .expect("Failed to create user schema");
    db.execute(db.get_database_backend().build(&create_product_table))
        .await
        .expect("Failed to create product schema");
    db.execute(db.get_database_backend().build(&create_review_table))
        .await
        .expect("Failed to create review schema");
    db.execute(db.get_database_backend().build(&create_order_table))
        .await
        .expect("Failed to create order schema");
    db.execute(db.get_database_backend().build(&create_order_item_table))
        .await
        .expect("Failed to create order item schema");
    db.execute(db.get_database_backend().build(&create_shipping_address_table))
        .await
        .expect("Failed to create shipping address schema");
}

//Seeds the staff account. Skipped when any user row already exists, so it is
//safe to call on every boot.
pub async fn primary_setup(db: Arc<DatabaseConnection>) {
    let existing = User::find()
        .count(&*db)
        .await
        .expect("Failed to count users during setup");
    if existing > 0 {
        return;
    }

    let admin_password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "AdminSecret15".to_owned());

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(admin_password.as_bytes(), &salt)
        .expect("Failed to hash password")
        .to_string();

    let new_admin = user::ActiveModel {
        username: Set("admin".to_owned()),
        email: Set("admin@example.com".to_owned()),
        password: Set(password_hash),
        first_name: Set("".to_owned()),
        last_name: Set("".to_owned()),
        is_staff: Set(true),
        ..Default::default()
    };

    match db.begin().await {
        Ok(txn) => match User::insert(new_admin).exec(&txn).await {
            Ok(_) => {
                if txn.commit().await.is_err() {
                    panic!("Failed to seed the staff account");
                }
            }
            Err(_) => {
                let _ = txn.rollback().await;
                panic!("Failed to seed the staff account");
            }
        },
        Err(_) => {
            panic!("Failed to seed the staff account");
        }
    }
}
