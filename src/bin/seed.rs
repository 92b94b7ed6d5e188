use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        categories::{self, Entity as Categories},
        enums::ProductKind,
        products::{self, Entity as Products},
        users::{self, Entity as Users},
    },
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    services::{
        auth_service::hash_password,
        inventory_service::{REASON_INITIAL, write_stock},
    },
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", ROLE_ADMIN).await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", ROLE_USER).await?;
    let category_id = ensure_category(&orm, "Goodies").await?;
    seed_products(&orm, category_id, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let existing = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?;
    if let Some(user) = existing {
        return Ok(user.id);
    }

    let password_hash = hash_password(password)?;
    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(role.to_string()),
        last_name: Set("Demo".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        phone: Set(None),
        role: Set(role.to_string()),
        reset_token: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;
    Ok(user.id)
}

async fn ensure_category(orm: &DatabaseConnection, name: &str) -> anyhow::Result<Uuid> {
    let existing = Categories::find()
        .filter(categories::Column::Name.eq(name))
        .one(orm)
        .await?;
    if let Some(category) = existing {
        return Ok(category.id);
    }

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(category.id)
}

async fn seed_products(
    orm: &DatabaseConnection,
    category_id: Uuid,
    admin_id: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        ("Ferris Hoodie", "Warm hoodie for Rustaceans", 5_500, 50),
        ("Ferris Mug", "Coffee tastes better with Ferris", 1_200, 100),
        ("Crab Sticker", "Decorate your laptop", 500, 200),
        ("Sold Out Poster", "Limited print", 2_500, 0),
    ];

    for (name, desc, price, stock) in products {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let now = Utc::now();
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(desc.to_string())),
            price: Set(price),
            category_id: Set(category_id),
            kind: Set(ProductKind::Standard),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;

        write_stock(orm, product.id, stock, Some(admin_id), REASON_INITIAL).await?;
    }

    println!("Seeded products");
    Ok(())
}
