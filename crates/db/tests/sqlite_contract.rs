//! The SQLite adapters and the in-memory adapters must answer the port contract identically;
//! the agent's tests rely on the in-memory ones.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use shopchat_core::domain::product::{OwnerScope, Product, ProductId};
use shopchat_core::domain::qa::{QaId, QaRecord};
use shopchat_core::ports::{CatalogStore, QaStore, ResponseCache};
use shopchat_db::{
    connect_with_settings, migrations, InMemoryCatalog, InMemoryQaStore, InMemoryResponseCache,
    SqlCatalogRepository, SqlQaRepository, SqlResponseCache,
};

fn products() -> Vec<Product> {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("timestamp");
    let product = |id: &str, name: &str, slug: &str, price: i64, minutes: i64, owner: Option<&str>| {
        let category = if name.starts_with("Quần") { "quần" } else { "áo" };
        Product {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            slug: slug.to_string(),
            price,
            description: "Vải cotton co giãn 4 chiều".to_string(),
            category: category.to_string(),
            active: true,
            owner_scope: owner.map(|owner| OwnerScope(owner.to_string())),
            created_at: base + Duration::minutes(minutes),
        }
    };
    let mut retired = product("p-retired", "Áo thun cũ", "ao-thun-cu", 90_000, 30, None);
    retired.active = false;

    vec![
        product("p-basic", "Áo thun basic", "ao-thun-basic", 150_000, 0, None),
        product("p-polo", "Áo polo nam", "ao-polo-nam", 250_000, 10, Some("shop-a")),
        product("p-jean", "Quần jean slim", "quan-jean-slim", 420_000, 20, Some("shop-a")),
        retired,
    ]
}

fn qa_records() -> Vec<QaRecord> {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("timestamp");
    vec![
        QaRecord {
            id: QaId("qa-ship".to_string()),
            question: "Phí ship bao nhiêu?".to_string(),
            answer: "Dạ phí ship đồng giá 30.000đ ạ.".to_string(),
            is_active: true,
            owner_scope: None,
            created_at: base,
        },
        QaRecord {
            id: QaId("qa-ship-new".to_string()),
            question: "phí ship".to_string(),
            answer: "Dạ shop miễn phí ship cho đơn từ 500.000đ ạ.".to_string(),
            is_active: true,
            owner_scope: None,
            created_at: base + Duration::days(1),
        },
    ]
}

async fn sqlite_stores() -> (Arc<SqlCatalogRepository>, Arc<SqlQaRepository>, Arc<SqlResponseCache>)
{
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");

    let catalog = SqlCatalogRepository::new(pool.clone());
    for product in products() {
        catalog.save(&product).await.expect("save product");
    }
    let qa = SqlQaRepository::new(pool.clone());
    for record in qa_records() {
        qa.save(&record).await.expect("save qa");
    }
    (Arc::new(catalog), Arc::new(qa), Arc::new(SqlResponseCache::new(pool)))
}

fn memory_stores() -> (Arc<InMemoryCatalog>, Arc<InMemoryQaStore>, Arc<InMemoryResponseCache>) {
    (
        Arc::new(InMemoryCatalog::with_products(products())),
        Arc::new(InMemoryQaStore::with_records(qa_records())),
        Arc::new(InMemoryResponseCache::default()),
    )
}

async fn catalog_answers(catalog: &dyn CatalogStore) -> Vec<Vec<String>> {
    let shop_a = OwnerScope("shop-a".to_string());
    let ids = |products: Vec<shopchat_core::domain::product::ProductSummary>| {
        products.into_iter().map(|product| product.id.0).collect::<Vec<_>>()
    };

    vec![
        ids(catalog.find_by_slug("AO-THUN-BASIC", None).await.expect("slug").into_iter().collect()),
        ids(catalog.find_by_slug("ao-thun-cu", None).await.expect("slug").into_iter().collect()),
        ids(catalog.search_by_text("áo", &[], None).await.expect("search")),
        ids(catalog.search_by_text("jean", &["bò".to_string()], Some(&shop_a)).await.expect("search")),
        ids(catalog.search_by_text("50%", &[], None).await.expect("search")),
        ids(catalog.list_active_for_owner(Some(&shop_a), 10).await.expect("list")),
    ]
}

#[tokio::test]
async fn catalog_adapters_agree() {
    let (sql_catalog, _, _) = sqlite_stores().await;
    let (memory_catalog, _, _) = memory_stores();

    let sql = catalog_answers(sql_catalog.as_ref()).await;
    let memory = catalog_answers(memory_catalog.as_ref()).await;

    assert_eq!(sql, memory);
    assert_eq!(sql[0], vec!["p-basic"]);
    assert!(sql[1].is_empty(), "inactive products are never returned");
    assert_eq!(sql[2], vec!["p-polo", "p-basic"]);
    assert_eq!(sql[3], vec!["p-jean"]);
    assert!(sql[4].is_empty(), "user input is not a LIKE pattern");
    assert_eq!(sql[5], vec!["p-jean", "p-polo"]);
}

#[tokio::test]
async fn qa_adapters_prefer_exact_then_newest() {
    let (_, sql_qa, _) = sqlite_stores().await;
    let (_, memory_qa, _) = memory_stores();

    for text in ["phí ship bao nhiêu?", "cho hỏi PHÍ SHIP về Huế", "đổi trả thế nào", "", "?", "p"] {
        let sql = sql_qa.find_match(text, None).await.expect("sql").map(|record| record.id);
        let memory = memory_qa.find_match(text, None).await.expect("memory").map(|record| record.id);
        assert_eq!(sql, memory, "disagreement for `{text}`");
    }
    let exact = sql_qa.find_match("phí ship bao nhiêu?", None).await.expect("sql");
    assert_eq!(exact.map(|record| record.id.0), Some("qa-ship".to_string()));
    let contained = sql_qa.find_match("cho hỏi PHÍ SHIP về Huế", None).await.expect("sql");
    assert_eq!(contained.map(|record| record.id.0), Some("qa-ship-new".to_string()));
}

#[tokio::test]
async fn qa_adapters_ignore_messages_without_enough_letters() {
    let (_, sql_qa, _) = sqlite_stores().await;
    let (_, memory_qa, _) = memory_stores();

    for text in ["?", "p", " ?! ", "h?"] {
        assert_eq!(sql_qa.find_match(text, None).await.expect("sql"), None, "sql matched `{text}`");
        assert_eq!(
            memory_qa.find_match(text, None).await.expect("memory"),
            None,
            "memory matched `{text}`"
        );
    }
}

#[tokio::test]
async fn cache_adapters_overwrite_on_set() {
    let (_, _, sql_cache) = sqlite_stores().await;
    let (_, _, memory_cache) = memory_stores();

    for cache in [sql_cache as Arc<dyn ResponseCache>, memory_cache as Arc<dyn ResponseCache>] {
        cache.set("chat:v1:key", "lần 1", 60).await.expect("set");
        cache.set("chat:v1:key", "lần 2", 60).await.expect("overwrite");
        assert_eq!(cache.get("chat:v1:key").await.expect("get"), Some("lần 2".to_string()));
        assert_eq!(cache.get("chat:v1:missing").await.expect("get"), None);
    }
}
