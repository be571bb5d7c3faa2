use async_trait::async_trait;
use shopchat_core::domain::product::{OwnerScope, Product, ProductId, ProductSummary};
use shopchat_core::errors::{Collaborator, CollaboratorError};
use shopchat_core::ports::{CatalogStore, SEARCH_LIMIT};
use sqlx::{sqlite::SqliteRow, Row};

use super::{fold_key, format_timestamp, RepositoryError};
use crate::DbPool;

const SUMMARY_COLUMNS: &str = "id, name, slug, price, description";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces a catalog record, refreshing its lowercase lookup columns.
    pub async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO product (
                id, owner_scope, name, slug, slug_key, price, description, category,
                search_text, active, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner_scope = excluded.owner_scope,
                name = excluded.name,
                slug = excluded.slug,
                slug_key = excluded.slug_key,
                price = excluded.price,
                description = excluded.description,
                category = excluded.category,
                search_text = excluded.search_text,
                active = excluded.active,
                created_at = excluded.created_at
            "#,
        )
        .bind(&product.id.0)
        .bind(product.owner_scope.as_ref().map(|owner| owner.0.as_str()))
        .bind(&product.name)
        .bind(&product.slug)
        .bind(fold_key(&product.slug))
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.category)
        .bind(search_text(product))
        .bind(product.active)
        .bind(format_timestamp(&product.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_by_slug(
        &self,
        slug: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<ProductSummary>, RepositoryError> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM product
             WHERE active = 1 AND slug_key = ? AND (? IS NULL OR owner_scope = ?)
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1"
        );
        let owner = owner.map(|owner| owner.0.as_str());
        let row = sqlx::query(&sql)
            .bind(fold_key(slug))
            .bind(owner)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(summary_from_row).transpose()
    }

    async fn query_by_text(
        &self,
        terms: &[String],
        owner: Option<&OwnerScope>,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let containment =
            terms.iter().map(|_| "instr(search_text, ?) > 0").collect::<Vec<_>>().join(" OR ");
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM product
             WHERE active = 1 AND (? IS NULL OR owner_scope = ?) AND ({containment})
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?"
        );
        let owner = owner.map(|owner| owner.0.as_str());
        let mut query = sqlx::query(&sql).bind(owner).bind(owner);
        for term in terms {
            query = query.bind(term.as_str());
        }
        let rows = query.bind(SEARCH_LIMIT as i64).fetch_all(&self.pool).await?;
        rows.iter().map(summary_from_row).collect()
    }

    async fn query_active(
        &self,
        owner: Option<&OwnerScope>,
        limit: usize,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM product
             WHERE active = 1 AND (? IS NULL OR owner_scope = ?)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?"
        );
        let owner = owner.map(|owner| owner.0.as_str());
        let rows = sqlx::query(&sql)
            .bind(owner)
            .bind(owner)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(summary_from_row).collect()
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogRepository {
    async fn find_by_slug(
        &self,
        slug: &str,
        owner: Option<&OwnerScope>,
    ) -> Result<Option<ProductSummary>, CollaboratorError> {
        if slug.trim().is_empty() {
            return Ok(None);
        }
        self.query_by_slug(slug, owner)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::Catalog))
    }

    async fn search_by_text(
        &self,
        keyword: &str,
        synonyms: &[String],
        owner: Option<&OwnerScope>,
    ) -> Result<Vec<ProductSummary>, CollaboratorError> {
        let terms = search_terms(keyword, synonyms);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        self.query_by_text(&terms, owner)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::Catalog))
    }

    async fn list_active_for_owner(
        &self,
        owner: Option<&OwnerScope>,
        limit: usize,
    ) -> Result<Vec<ProductSummary>, CollaboratorError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.query_active(owner, limit)
            .await
            .map_err(|error| error.into_collaborator(Collaborator::Catalog))
    }
}

/// Lowercased name, category and description joined for containment search.
pub(crate) fn search_text(product: &Product) -> String {
    format!("{}\n{}\n{}", product.name, product.category, product.description).to_lowercase()
}

/// Folded keyword followed by its synonyms, blanks and duplicates removed.
pub(crate) fn search_terms(keyword: &str, synonyms: &[String]) -> Vec<String> {
    let mut terms: Vec<String> = Vec::with_capacity(synonyms.len() + 1);
    for term in std::iter::once(keyword).chain(synonyms.iter().map(String::as_str)) {
        let folded = fold_key(term);
        if !folded.is_empty() && !terms.contains(&folded) {
            terms.push(folded);
        }
    }
    terms
}

fn summary_from_row(row: &SqliteRow) -> Result<ProductSummary, RepositoryError> {
    let price: i64 = row.try_get("price")?;
    if price < 0 {
        return Err(RepositoryError::Decode(format!("negative price `{price}`")));
    }
    Ok(ProductSummary {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        price,
        description: row.try_get("description")?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use shopchat_core::domain::product::{OwnerScope, Product, ProductId};
    use shopchat_core::errors::{Collaborator, CollaboratorError};
    use shopchat_core::ports::CatalogStore;

    use super::SqlCatalogRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    fn product(id: &str, name: &str, slug: &str, minutes: i64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            slug: slug.to_string(),
            price: 150_000,
            description: format!("Mô tả {name}"),
            category: "thời trang".to_string(),
            active: true,
            owner_scope: Some(OwnerScope("shop-a".to_string())),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).single().expect("timestamp")
                + Duration::minutes(minutes),
        }
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn slug_lookup_is_case_insensitive_and_active_only() {
        let repo = SqlCatalogRepository::new(setup_pool().await);
        repo.save(&product("p-1", "Áo thun basic", "ao-thun-basic", 0)).await.expect("save");
        let mut hidden = product("p-2", "Quần jean", "quan-jean-xanh", 1);
        hidden.active = false;
        repo.save(&hidden).await.expect("save inactive");

        let found = repo.find_by_slug("AO-THUN-BASIC", None).await.expect("lookup");
        assert_eq!(found.map(|summary| summary.id), Some(ProductId("p-1".to_string())));
        assert_eq!(repo.find_by_slug("quan-jean-xanh", None).await.expect("lookup"), None);
        assert_eq!(repo.find_by_slug("  ", None).await.expect("blank"), None);
    }

    #[tokio::test]
    async fn owner_scope_filters_when_given() {
        let repo = SqlCatalogRepository::new(setup_pool().await);
        repo.save(&product("p-1", "Áo thun basic", "ao-thun-basic", 0)).await.expect("save");

        let other = OwnerScope("shop-b".to_string());
        assert_eq!(repo.find_by_slug("ao-thun-basic", Some(&other)).await.expect("lookup"), None);
        let own = OwnerScope("shop-a".to_string());
        assert!(repo.find_by_slug("ao-thun-basic", Some(&own)).await.expect("lookup").is_some());
    }

    #[tokio::test]
    async fn text_search_uses_synonyms_newest_first_and_caps_results() {
        let repo = SqlCatalogRepository::new(setup_pool().await);
        for index in 0..7 {
            repo.save(&product(
                &format!("p-{index}"),
                &format!("ÁO THUN mẫu {index}"),
                &format!("ao-thun-mau-{index}"),
                index,
            ))
            .await
            .expect("save");
        }
        repo.save(&product("p-polo", "Polo nam", "polo-nam-basic", 100)).await.expect("save");

        let results = repo
            .search_by_text("áo thun", &["polo".to_string()], None)
            .await
            .expect("search");

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].id, ProductId("p-polo".to_string()));
        assert_eq!(results[1].id, ProductId("p-6".to_string()));
        assert!(repo.search_by_text(" ", &[], None).await.expect("blank").is_empty());
    }

    #[tokio::test]
    async fn list_active_for_owner_returns_newest_first() {
        let repo = SqlCatalogRepository::new(setup_pool().await);
        repo.save(&product("p-old", "Váy hoa", "vay-hoa-nhi", 0)).await.expect("save");
        repo.save(&product("p-new", "Đầm maxi", "dam-maxi-di-bien", 5)).await.expect("save");

        let listed = repo
            .list_active_for_owner(Some(&OwnerScope("shop-a".to_string())), 10)
            .await
            .expect("list");
        let ids = listed.into_iter().map(|summary| summary.id.0).collect::<Vec<_>>();
        assert_eq!(ids, vec!["p-new".to_string(), "p-old".to_string()]);
    }

    #[tokio::test]
    async fn closed_pool_reports_catalog_unavailable() {
        let pool = setup_pool().await;
        let repo = SqlCatalogRepository::new(pool.clone());
        pool.close().await;

        let error = repo.find_by_slug("ao-thun-basic", None).await.expect_err("closed pool");
        assert!(matches!(
            error,
            CollaboratorError::Unavailable { collaborator: Collaborator::Catalog, .. }
        ));
    }
}
