mod models;

pub use models::*;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("swiftshop.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = connect(&db_url).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Connect to a database URL and bring the schema up to date.
/// Split out from `init` so tests can run against `sqlite::memory:`.
pub async fn connect(db_url: &str) -> Result<DbPool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    info!("Migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> DbPool {
        connect("sqlite::memory:").await.expect("in-memory pool")
    }

    #[tokio::test]
    async fn migrations_create_all_collections() {
        let pool = test_pool().await;

        for table in ["users", "products", "orders", "contacts"] {
            let found: Option<(String,)> = sqlx::query_as(
                "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
            )
            .bind(table)
            .fetch_optional(&pool)
            .await
            .unwrap();
            assert!(found.is_some(), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let pool = test_pool().await;

        let insert = "INSERT INTO users (id, name, email, username, password_hash) VALUES (?, ?, ?, ?, ?)";
        sqlx::query(insert)
            .bind("u1")
            .bind("A")
            .bind("a@x.com")
            .bind("a1")
            .bind("hash")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query(insert)
            .bind("u2")
            .bind("B")
            .bind("a@x.com")
            .bind("b2")
            .bind("hash")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let pool = test_pool().await;

        let insert = "INSERT INTO users (id, name, email, username, password_hash) VALUES (?, ?, ?, ?, ?)";
        sqlx::query(insert)
            .bind("u1")
            .bind("A")
            .bind("a@x.com")
            .bind("a1")
            .bind("hash")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query(insert)
            .bind("u2")
            .bind("B")
            .bind("b@x.com")
            .bind("a1")
            .bind("hash")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[tokio::test]
    async fn checkout_persists_the_cart_snapshot() {
        use crate::cart::{Cart, ShippingDetails};

        let pool = test_pool().await;

        sqlx::query("INSERT INTO products (id, name, price) VALUES ('p1', 'Runner', 1000)")
            .execute(&pool)
            .await
            .unwrap();
        let product: Product = sqlx::query_as("SELECT * FROM products WHERE id = 'p1'")
            .fetch_one(&pool)
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_line(&product, "42");
        cart.add_line(&product, "42");

        let shipping = ShippingDetails {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "0700000000".to_string(),
            address: "Street 1".to_string(),
        };
        let req = cart.checkout("u1", &shipping).unwrap();

        let items_json = serde_json::to_string(&req.items).unwrap();
        sqlx::query(
            "INSERT INTO orders (id, user_id, items, total, shipping_name, shipping_email, shipping_phone, shipping_address)
             VALUES ('o1', ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&req.user_id)
        .bind(&items_json)
        .bind(req.total)
        .bind(&req.shipping_name)
        .bind(&req.shipping_email)
        .bind(&req.shipping_phone)
        .bind(&req.shipping_address)
        .execute(&pool)
        .await
        .unwrap();

        let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = 'o1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(order.total, 2000);
        assert_eq!(order.status, "pending");
        let items = order.get_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn deleting_a_product_leaves_orders_intact() {
        let pool = test_pool().await;

        sqlx::query("INSERT INTO products (id, name, price) VALUES ('p1', 'Sneaker', 1000)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO orders (id, user_id, items, total, shipping_name, shipping_email, shipping_phone, shipping_address)
             VALUES ('o1', 'u1', '[{\"product_id\":\"p1\"}]', 1000, 'A', 'a@x.com', '0700000000', 'Street 1')",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query("DELETE FROM products WHERE id = 'p1'")
            .execute(&pool)
            .await
            .unwrap();

        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining.0, 1);
    }
}
