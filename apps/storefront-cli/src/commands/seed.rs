//! `storefront seed`.

use storefront_db::{Database, DbConfig, DbResult, SeedSummary};

/// Migrates, then inserts the demo catalogue. Rows that already exist are
/// left untouched.
pub async fn run(config: DbConfig) -> DbResult<SeedSummary> {
    let db = Database::new(config.run_migrations(true)).await?;
    let summary = db.seed().await?;
    db.close().await;

    if summary.total() == 0 {
        println!("Catalogue already seeded; nothing inserted");
    } else {
        println!(
            "Seeded {} products, {} suppliers, {} supplier links, {} customers, {} sales",
            summary.products,
            summary.suppliers,
            summary.product_suppliers,
            summary.customers,
            summary.sales
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_twice_inserts_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");

        let first = run(DbConfig::new(&path)).await.unwrap();
        assert!(first.products > 0);

        let second = run(DbConfig::new(&path)).await.unwrap();
        assert_eq!(second, SeedSummary::default());
    }
}
