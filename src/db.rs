use anyhow::Result;
use sea_orm::sea_query::{Expr, Index, LockType};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, QuerySelect, Schema,
};

use crate::entity::{self, cart_items, inventories, order_items, products, wishlist_items};

pub type OrmConn = DatabaseConnection;

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    if database_url.starts_with("sqlite") {
        // every pooled connection to `sqlite::memory:` would see its own empty database
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Postgres gets the versioned SQL files in `migrations/`; SQLite gets tables
/// generated from the entity definitions.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    match conn.get_database_backend() {
        DbBackend::Postgres => {
            let pool = conn.get_postgres_connection_pool();
            sqlx::migrate!("./migrations").run(pool).await?;
        }
        _ => create_schema(conn).await?,
    }
    Ok(())
}

pub async fn create_schema(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    macro_rules! create {
        ($($entity:expr $(=> [$($check:expr),+])?),+ $(,)?) => {
            $(
                let mut stmt = schema.create_table_from_entity($entity);
                stmt.if_not_exists();
                $($(stmt.check($check);)+)?
                conn.execute(backend.build(&stmt)).await?;
            )+
        };
    }

    // parents before children; checks mirror migrations/0001_init.sql
    create!(
        entity::Users,
        entity::Categories,
        entity::SubCategories,
        entity::Products => [Expr::col(products::Column::Price).gte(0)],
        entity::ProductDetails,
        entity::ProductImages,
        entity::ProductSubCategories,
        entity::Promotions,
        entity::ProductPromotions,
        entity::Inventories => [Expr::col(inventories::Column::Quantity).gte(0)],
        entity::InventoryHistory,
        entity::Carts,
        entity::CartItems => [Expr::col(cart_items::Column::Quantity).gt(0)],
        entity::Orders,
        entity::OrderItems => [Expr::col(order_items::Column::Quantity).gt(0)],
        entity::Wishlists,
        entity::WishlistItems,
        entity::Addresses,
        entity::AuditLogs,
    );

    let unique_pairs = [
        Index::create()
            .name("uq_cart_items_cart_product")
            .table(entity::CartItems)
            .col(cart_items::Column::CartId)
            .col(cart_items::Column::ProductId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("uq_wishlist_items_wishlist_product")
            .table(entity::WishlistItems)
            .col(wishlist_items::Column::WishlistId)
            .col(wishlist_items::Column::ProductId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ];
    for index in &unique_pairs {
        conn.execute(backend.build(index)).await?;
    }

    Ok(())
}

/// `SELECT ... FOR UPDATE` where the backend supports row locks.
pub fn for_update<Q>(query: Q, backend: DbBackend) -> Q
where
    Q: QuerySelect,
{
    match backend {
        DbBackend::Sqlite => query,
        _ => query.lock(LockType::Update),
    }
}
