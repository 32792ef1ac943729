//! `storefront tour`: a guided run over the seeded catalogue.
//!
//! ```text
//! 1. Eager     products.all_with_sales()        one query per relation
//! 2. Explicit  loading::load_collection(...)    caller decides when
//! 3. Lazy      products.get_lazy(id)            first access queries
//! 4. Many-to-many suppliers of a product
//! 5. Concurrency: two readers, one stale save, resolve + retry
//! ```

use storefront_core::{Product, Sale};
use storefront_db::loading;
use storefront_db::{
    resolve_conflict, ConflictStrategy, Database, DbConfig, DbError, DbResult, Repository,
};
use tracing::{info, warn};

/// Product the walkthrough focuses on (first seeded row).
const FOCUS_PRODUCT_ID: i64 = 1;

/// Runs the tour against `config`, seeding first.
pub async fn run(config: DbConfig) -> DbResult<()> {
    let db = Database::new(config.run_migrations(true)).await?;
    let seeded = db.seed().await?;
    info!(rows = seeded.total(), "Catalogue ready");

    eager(&db).await?;
    explicit(&db).await?;
    lazy(&db).await?;
    suppliers(&db).await?;
    concurrency(&db).await?;

    db.close().await;
    Ok(())
}

async fn eager(db: &Database) -> DbResult<()> {
    println!("== Eager loading: products with their sales ==");
    for entry in db.products().all_with_sales().await? {
        println!(
            "  {:<24} {:>2} sale(s)  {:>10}",
            entry.parent.name,
            entry.children.len(),
            entry.total_sales().to_string()
        );
    }

    println!("== Eager loading: sales with their product ==");
    for entry in db.sales().all_with_product().await? {
        let name = entry
            .parent
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("<missing>");
        println!("  sale #{:<3} {:>10}  {}", entry.child.id, entry.child.amount().to_string(), name);
    }
    Ok(())
}

async fn explicit(db: &Database) -> DbResult<()> {
    println!("== Explicit loading ==");
    let products = db.products();
    let Some(product) = products.get_by_id(FOCUS_PRODUCT_ID).await? else {
        println!("  product {FOCUS_PRODUCT_ID} not found");
        return Ok(());
    };

    let sales: Vec<Sale> = loading::load_collection(db.pool(), &product).await?;
    println!("  {} loaded; now fetching its sales -> {}", product.name, sales.len());

    if let Some(sale) = sales.first() {
        let parent: Option<Product> = loading::load_reference(db.pool(), sale).await?;
        println!(
            "  sale #{} belongs to {}",
            sale.id,
            parent.map(|p| p.name).unwrap_or_default()
        );
    }
    Ok(())
}

async fn lazy(db: &Database) -> DbResult<()> {
    println!("== Lazy loading ==");
    let Some(lazy) = db.products().get_lazy(FOCUS_PRODUCT_ID).await? else {
        return Ok(());
    };

    println!("  {} sales loaded? {}", lazy.product.name, lazy.sales.is_loaded());
    let count = lazy.sales.get().await?.len();
    println!("  accessed -> {count} sale(s); loaded? {}", lazy.sales.is_loaded());
    Ok(())
}

async fn suppliers(db: &Database) -> DbResult<()> {
    println!("== Many-to-many: suppliers ==");
    if let Some(entry) = db.products().get_with_suppliers(FOCUS_PRODUCT_ID).await? {
        let names: Vec<&str> = entry.suppliers.iter().map(|s| s.name.as_str()).collect();
        println!("  {} <- {}", entry.product.name, names.join(", "));
    }
    Ok(())
}

async fn concurrency(db: &Database) -> DbResult<()> {
    println!("== Optimistic concurrency ==");
    let first = db.products();
    let second = db.products();

    let Some(mut mine) = first.get_by_id(FOCUS_PRODUCT_ID).await? else {
        return Ok(());
    };
    let Some(mut theirs) = second.get_by_id(FOCUS_PRODUCT_ID).await? else {
        return Ok(());
    };
    println!("  both readers hold version {}", mine.version);

    mine.price_cents += 100;
    first.update(mine).await;
    first.save().await?;
    println!("  reader 1 saved a price change");

    theirs.stock_quantity += 1;
    second.update(theirs.clone()).await;
    match second.save().await {
        Err(err) if err.is_concurrency_conflict() => {
            warn!(error = %err, "Stale update rejected");
            println!("  reader 2 rejected: {err}");
        }
        Err(err) => return Err(err),
        Ok(_) => {
            return Err(DbError::Internal("stale update was accepted".to_string()))
        }
    }

    let resolved = resolve_conflict(&*second, &theirs, ConflictStrategy::ClientWins).await?;
    second.update(resolved).await;
    second.save().await?;

    if let Some(stored) = second.get_by_id(FOCUS_PRODUCT_ID).await? {
        println!(
            "  reader 2 retried: price {}, stock {}, version {}",
            stored.price(),
            stored.stock_quantity,
            stored.version
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tour_in_memory() {
        run(DbConfig::in_memory()).await.unwrap();
    }

    #[tokio::test]
    async fn test_tour_client_wins_on_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.seed().await.unwrap();
        let before = db
            .products()
            .get_by_id(FOCUS_PRODUCT_ID)
            .await
            .unwrap()
            .unwrap();
        db.close().await;

        run(DbConfig::new(&path)).await.unwrap();

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let after = db
            .products()
            .get_by_id(FOCUS_PRODUCT_ID)
            .await
            .unwrap()
            .unwrap();
        // ClientWins: reader 2's full row overwrites reader 1's price change
        assert_eq!(after.price_cents, before.price_cents);
        assert_eq!(after.stock_quantity, before.stock_quantity + 1);
        assert_eq!(after.version, before.version + 2);
    }
}
