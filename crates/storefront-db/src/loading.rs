//! # Loading Related Rows
//!
//! Relationship declarations plus the three ways of fetching related rows.
//!
//! ## Strategies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  EAGER     include::<Product, Sale>(pool, products)                     │
//! │            1 query for parents (caller) + 1 `IN (...)` query per        │
//! │            relationship, grouped in memory                              │
//! │                                                                         │
//! │  EXPLICIT  load_collection::<Product, Sale>(pool, &product)             │
//! │            load_reference::<Sale, Product>(pool, &sale)                 │
//! │            caller decides when, one query per call                      │
//! │                                                                         │
//! │  LAZY      LazyCollection<Product, Sale> / LazyReference<Sale, Product> │
//! │            nothing fetched until first `get()`, then cached             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Relationship Configuration
//! A one-to-many relationship is declared once, on the child:
//! ```rust,ignore
//! impl BelongsTo<Product> for Sale {
//!     const FOREIGN_KEY: &'static str = "product_id";
//!     fn parent_id(&self) -> Option<i64> { Some(self.product_id) }
//! }
//! ```
//! Many-to-many (product ↔ supplier) goes through
//! [`ProductSupplierRepository`](crate::repository::ProductSupplierRepository).

use std::collections::HashMap;
use std::marker::PhantomData;

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::entity::{self, Entity};
use crate::error::DbResult;
use storefront_core::{Customer, Product, Sale};

/// Largest number of ids bound into a single `IN (...)` list.
const IN_CHUNK_SIZE: usize = 500;

// =============================================================================
// Relationships
// =============================================================================

/// Declares that `Self` rows reference a `P` row through a foreign key.
pub trait BelongsTo<P: Entity>: Entity {
    /// Foreign key column on `Self::TABLE`.
    const FOREIGN_KEY: &'static str;

    /// The referenced parent id; `None` for an unset optional reference.
    fn parent_id(&self) -> Option<i64>;
}

impl BelongsTo<Product> for Sale {
    const FOREIGN_KEY: &'static str = "product_id";

    fn parent_id(&self) -> Option<i64> {
        Some(self.product_id)
    }
}

impl BelongsTo<Customer> for Sale {
    const FOREIGN_KEY: &'static str = "customer_id";

    fn parent_id(&self) -> Option<i64> {
        self.customer_id
    }
}

/// A parent row with its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithChildren<P, C> {
    pub parent: P,
    pub children: Vec<C>,
}

/// A child row with its (optional) parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithParent<C, P> {
    pub child: C,
    pub parent: Option<P>,
}

// =============================================================================
// Explicit Loading
// =============================================================================

/// Loads the children of `parent`.
pub async fn load_collection<P, C>(pool: &SqlitePool, parent: &P) -> DbResult<Vec<C>>
where
    P: Entity,
    C: BelongsTo<P>,
{
    children_of::<P, C>(pool, parent.id()).await
}

/// Loads the parent referenced by `child`.
pub async fn load_reference<C, P>(pool: &SqlitePool, child: &C) -> DbResult<Option<P>>
where
    C: BelongsTo<P>,
    P: Entity,
{
    match BelongsTo::<P>::parent_id(child) {
        Some(id) => row_by_id::<P>(pool, id).await,
        None => Ok(None),
    }
}

async fn children_of<P, C>(pool: &SqlitePool, parent_id: i64) -> DbResult<Vec<C>>
where
    P: Entity,
    C: BelongsTo<P>,
{
    let sql = format!(
        "SELECT * FROM {} WHERE {} = ? ORDER BY id",
        C::TABLE,
        <C as BelongsTo<P>>::FOREIGN_KEY
    );
    let children = sqlx::query_as::<_, C>(&sql)
        .bind(parent_id)
        .fetch_all(pool)
        .await?;

    debug!(
        parent = P::NAME,
        child = C::NAME,
        parent_id,
        count = children.len(),
        "Loaded collection"
    );
    Ok(children)
}

async fn row_by_id<T: Entity>(pool: &SqlitePool, id: i64) -> DbResult<Option<T>> {
    let sql = entity::select_by_id_sql::<T>();
    let row = sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// `SELECT * FROM {table} WHERE {column} IN (ids...)`, chunked.
async fn rows_where_in<T: Entity>(
    pool: &SqlitePool,
    column: &str,
    ids: &[i64],
) -> DbResult<Vec<T>> {
    let mut rows = Vec::new();

    for chunk in ids.chunks(IN_CHUNK_SIZE) {
        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT * FROM {} WHERE {} IN (", T::TABLE, column));
        {
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
        }
        builder.push(") ORDER BY id");

        rows.extend(builder.build_query_as::<T>().fetch_all(pool).await?);
    }

    Ok(rows)
}

// =============================================================================
// Eager Loading
// =============================================================================

/// Attaches each parent's children using one query per chunk of parents.
/// Parent order is preserved; children are ordered by id. A parent listed
/// twice gets the same children both times.
pub async fn include<P, C>(pool: &SqlitePool, parents: Vec<P>) -> DbResult<Vec<WithChildren<P, C>>>
where
    P: Entity,
    C: BelongsTo<P>,
{
    if parents.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = parents.iter().map(|p| p.id()).collect();
    let children: Vec<C> = rows_where_in(pool, <C as BelongsTo<P>>::FOREIGN_KEY, &ids).await?;

    let mut grouped: HashMap<i64, Vec<C>> = HashMap::new();
    for child in children {
        if let Some(parent_id) = BelongsTo::<P>::parent_id(&child) {
            grouped.entry(parent_id).or_default().push(child);
        }
    }

    debug!(parent = P::NAME, child = C::NAME, parents = ids.len(), "Included collection");

    Ok(parents
        .into_iter()
        .map(|parent| {
            let children = grouped.get(&parent.id()).cloned().unwrap_or_default();
            WithChildren { parent, children }
        })
        .collect())
}

/// Attaches each child's parent using one query per chunk of distinct parent ids.
pub async fn include_reference<C, P>(
    pool: &SqlitePool,
    children: Vec<C>,
) -> DbResult<Vec<WithParent<C, P>>>
where
    C: BelongsTo<P>,
    P: Entity,
{
    let mut parent_ids: Vec<i64> = children
        .iter()
        .filter_map(|c| BelongsTo::<P>::parent_id(c))
        .collect();
    parent_ids.sort_unstable();
    parent_ids.dedup();

    let parents: HashMap<i64, P> = if parent_ids.is_empty() {
        HashMap::new()
    } else {
        rows_where_in::<P>(pool, "id", &parent_ids)
            .await?
            .into_iter()
            .map(|p| (p.id(), p))
            .collect()
    };

    debug!(child = C::NAME, parent = P::NAME, parents = parents.len(), "Included reference");

    Ok(children
        .into_iter()
        .map(|child| {
            let parent = BelongsTo::<P>::parent_id(&child).and_then(|id| parents.get(&id).cloned());
            WithParent { child, parent }
        })
        .collect())
}

// =============================================================================
// Lazy Loading
// =============================================================================

/// Children of one parent, fetched on first access.
#[derive(Debug)]
pub struct LazyCollection<P, C> {
    pool: SqlitePool,
    parent_id: i64,
    loaded: OnceCell<Vec<C>>,
    _parent: PhantomData<fn() -> P>,
}

impl<P, C> LazyCollection<P, C>
where
    P: Entity,
    C: BelongsTo<P>,
{
    pub fn new(pool: SqlitePool, parent: &P) -> Self {
        LazyCollection {
            pool,
            parent_id: parent.id(),
            loaded: OnceCell::new(),
            _parent: PhantomData,
        }
    }

    /// Returns the children, querying the database on the first call only.
    pub async fn get(&self) -> DbResult<&[C]> {
        let children = self
            .loaded
            .get_or_try_init(|| children_of::<P, C>(&self.pool, self.parent_id))
            .await?;
        Ok(children.as_slice())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Consumes the proxy, loading first if needed.
    pub async fn into_inner(self) -> DbResult<Vec<C>> {
        self.get().await?;
        Ok(self.loaded.into_inner().unwrap_or_default())
    }
}

/// The parent of one child, fetched on first access.
#[derive(Debug)]
pub struct LazyReference<C, P> {
    pool: SqlitePool,
    parent_id: Option<i64>,
    loaded: OnceCell<Option<P>>,
    _child: PhantomData<fn() -> C>,
}

impl<C, P> LazyReference<C, P>
where
    C: BelongsTo<P>,
    P: Entity,
{
    pub fn new(pool: SqlitePool, child: &C) -> Self {
        LazyReference {
            pool,
            parent_id: BelongsTo::<P>::parent_id(child),
            loaded: OnceCell::new(),
            _child: PhantomData,
        }
    }

    /// Returns the parent, querying the database on the first call only.
    pub async fn get(&self) -> DbResult<Option<&P>> {
        let parent = self
            .loaded
            .get_or_try_init(|| async {
                match self.parent_id {
                    Some(id) => row_by_id::<P>(&self.pool, id).await,
                    None => Ok(None),
                }
            })
            .await?;
        Ok(parent.as_ref())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::Repository;
    use chrono::{NaiveDate, Utc};

    struct Fixture {
        db: Database,
        laptop: Product,
        mouse: Product,
        ada: Customer,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let products = db.repository::<Product>();
        products.add(Product::new("Laptop", 99_900, 5, date)).await;
        products.add(Product::new("Mouse", 2_500, 50, date)).await;
        let ids = products.save().await.unwrap().inserted_ids;

        let customers = db.repository::<Customer>();
        customers.add(Customer::new("Ada")).await;
        let ada_id = customers.save().await.unwrap().inserted_ids[0];

        let sales = db.repository::<Sale>();
        sales.add(Sale::new(ids[0], 99_900, Utc::now()).for_customer(ada_id)).await;
        sales.add(Sale::new(ids[0], 95_000, Utc::now())).await;
        sales.save().await.unwrap();

        Fixture {
            laptop: products.get_by_id(ids[0]).await.unwrap().unwrap(),
            mouse: products.get_by_id(ids[1]).await.unwrap().unwrap(),
            ada: customers.get_by_id(ada_id).await.unwrap().unwrap(),
            db,
        }
    }

    #[tokio::test]
    async fn test_explicit_collection() {
        let f = fixture().await;
        let pool = f.db.pool();

        let sales: Vec<Sale> = load_collection::<Product, Sale>(pool, &f.laptop).await.unwrap();
        assert_eq!(sales.len(), 2);

        let none: Vec<Sale> = load_collection::<Product, Sale>(pool, &f.mouse).await.unwrap();
        assert!(none.is_empty());

        let ada_sales: Vec<Sale> = load_collection::<Customer, Sale>(pool, &f.ada).await.unwrap();
        assert_eq!(ada_sales.len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_reference() {
        let f = fixture().await;
        let pool = f.db.pool();
        let sales: Vec<Sale> = load_collection::<Product, Sale>(pool, &f.laptop).await.unwrap();

        let product: Option<Product> = load_reference::<Sale, Product>(pool, &sales[0]).await.unwrap();
        assert_eq!(product.unwrap().name, "Laptop");

        // The second sale has no customer
        let customer: Option<Customer> =
            load_reference::<Sale, Customer>(pool, &sales[1]).await.unwrap();
        assert!(customer.is_none());
    }

    #[tokio::test]
    async fn test_eager_matches_explicit() {
        let f = fixture().await;
        let pool = f.db.pool();

        let products = f.db.repository::<Product>().get_all().await.unwrap();
        let included: Vec<WithChildren<Product, Sale>> = include(pool, products).await.unwrap();

        assert_eq!(included.len(), 2);
        assert_eq!(included[0].parent.name, "Laptop");
        assert_eq!(
            included[0].children,
            load_collection::<Product, Sale>(pool, &f.laptop).await.unwrap()
        );
        assert!(included[1].children.is_empty());
    }

    #[tokio::test]
    async fn test_include_reference() {
        let f = fixture().await;
        let pool = f.db.pool();
        let sales = f.db.repository::<Sale>().get_all().await.unwrap();

        let with_customer: Vec<WithParent<Sale, Customer>> =
            include_reference(pool, sales).await.unwrap();
        assert_eq!(with_customer[0].parent.as_ref().map(|c| c.name.as_str()), Some("Ada"));
        assert!(with_customer[1].parent.is_none());
    }

    #[tokio::test]
    async fn test_include_repeated_parent() {
        let f = fixture().await;
        let included: Vec<WithChildren<Product, Sale>> =
            include(f.db.pool(), vec![f.laptop.clone(), f.laptop.clone()])
                .await
                .unwrap();

        assert_eq!(included.len(), 2);
        assert_eq!(included[0].children.len(), 2);
        assert_eq!(included[1].children, included[0].children);
    }

    #[tokio::test]
    async fn test_include_empty_input() {
        let f = fixture().await;
        let included: Vec<WithChildren<Product, Sale>> =
            include(f.db.pool(), Vec::new()).await.unwrap();
        assert!(included.is_empty());
    }

    #[tokio::test]
    async fn test_lazy_collection_loads_once() {
        let f = fixture().await;
        let lazy: LazyCollection<Product, Sale> =
            LazyCollection::new(f.db.pool().clone(), &f.laptop);
        assert!(!lazy.is_loaded());

        assert_eq!(lazy.get().await.unwrap().len(), 2);
        assert!(lazy.is_loaded());

        // A sale added after the first access is not seen by the cached proxy
        let sales = f.db.repository::<Sale>();
        sales.add(Sale::new(f.laptop.id, 1_000, Utc::now())).await;
        sales.save().await.unwrap();
        assert_eq!(lazy.get().await.unwrap().len(), 2);

        assert_eq!(lazy.into_inner().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_lazy_reference() {
        let f = fixture().await;
        let sales = f.db.repository::<Sale>().get_all().await.unwrap();

        let product: LazyReference<Sale, Product> =
            LazyReference::new(f.db.pool().clone(), &sales[0]);
        assert!(!product.is_loaded());
        assert_eq!(product.get().await.unwrap().map(|p| p.id), Some(f.laptop.id));
        assert!(product.is_loaded());

        let customer: LazyReference<Sale, Customer> =
            LazyReference::new(f.db.pool().clone(), &sales[1]);
        assert!(customer.get().await.unwrap().is_none());
    }
}
