use std::sync::Arc;

use shopchat_core::classifier::slug_tokens;
use shopchat_core::domain::context::MAX_CONTEXT_PRODUCTS;
use shopchat_core::domain::product::{OwnerScope, ProductSummary};
use shopchat_core::errors::CollaboratorError;
use shopchat_core::ports::CatalogStore;
use shopchat_core::taxonomy::KeywordTaxonomy;
use tracing::{debug, error, warn};

/// Products considered when scanning history for a previously mentioned name.
pub const HISTORY_CANDIDATE_LIMIT: usize = 10;
const ASSISTANT_PREFIXES: &[&str] = &["assistant:", "trợ lý:", "bot:", "shop:"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolverTier {
    PageSlug,
    SlugInText,
    KeywordSearch,
    History,
}

impl ResolverTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageSlug => "page_slug",
            Self::SlugInText => "slug_in_text",
            Self::KeywordSearch => "keyword_search",
            Self::History => "history",
        }
    }
}

pub struct ResolveRequest<'a> {
    pub text: &'a str,
    pub history: &'a str,
    pub page_slug: Option<&'a str>,
    pub search_keyword: Option<&'a str>,
    pub owner: Option<&'a OwnerScope>,
    pub correlation_id: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub products: Vec<ProductSummary>,
    pub tier: Option<ResolverTier>,
}

/// Finds the products a message is about. Tiers run in order and the first non-empty one wins.
pub struct ProductResolver {
    catalog: Arc<dyn CatalogStore>,
    taxonomy: &'static KeywordTaxonomy,
}

impl ProductResolver {
    pub fn new(catalog: Arc<dyn CatalogStore>, taxonomy: &'static KeywordTaxonomy) -> Self {
        Self { catalog, taxonomy }
    }

    pub async fn resolve(&self, request: &ResolveRequest<'_>) -> Resolution {
        if let Some(slug) = request.page_slug.map(str::trim).filter(|slug| !slug.is_empty()) {
            if let Some(product) = self.lookup_slug(slug, request, ResolverTier::PageSlug).await {
                return hit(request, ResolverTier::PageSlug, vec![product]);
            }
        }

        for token in slug_tokens(request.text) {
            if let Some(product) = self.lookup_slug(&token, request, ResolverTier::SlugInText).await
            {
                return hit(request, ResolverTier::SlugInText, vec![product]);
            }
        }

        if let Some(keyword) = request.search_keyword.filter(|keyword| !keyword.trim().is_empty()) {
            let synonyms = self.taxonomy.expand(keyword);
            match self.catalog.search_by_text(keyword, &synonyms, request.owner).await {
                Ok(mut products) if !products.is_empty() => {
                    products.truncate(MAX_CONTEXT_PRODUCTS);
                    return hit(request, ResolverTier::KeywordSearch, products);
                }
                Ok(_) => {}
                Err(failure) => log_failure(request, ResolverTier::KeywordSearch, &failure),
            }
        }

        if let Some(product) = self.from_history(request).await {
            return hit(request, ResolverTier::History, vec![product]);
        }

        debug!(
            event_name = "chat.resolver.miss",
            correlation_id = %request.correlation_id,
            "no product resolved"
        );
        Resolution::default()
    }

    async fn lookup_slug(
        &self,
        slug: &str,
        request: &ResolveRequest<'_>,
        tier: ResolverTier,
    ) -> Option<ProductSummary> {
        match self.catalog.find_by_slug(slug, request.owner).await {
            Ok(product) => product,
            Err(failure) => {
                log_failure(request, tier, &failure);
                None
            }
        }
    }

    async fn from_history(&self, request: &ResolveRequest<'_>) -> Option<ProductSummary> {
        let assistant_lines = request
            .history
            .lines()
            .rev()
            .filter(is_assistant_line)
            .map(str::to_lowercase)
            .collect::<Vec<_>>();
        if assistant_lines.is_empty() {
            return None;
        }

        let candidates =
            match self.catalog.list_active_for_owner(request.owner, HISTORY_CANDIDATE_LIMIT).await {
                Ok(candidates) => candidates,
                Err(failure) => {
                    log_failure(request, ResolverTier::History, &failure);
                    return None;
                }
            };

        assistant_lines.iter().find_map(|line| {
            candidates
                .iter()
                .find(|product| {
                    let name = product.name.trim().to_lowercase();
                    !name.is_empty() && line.contains(&name)
                })
                .cloned()
        })
    }
}

fn hit(
    request: &ResolveRequest<'_>,
    tier: ResolverTier,
    products: Vec<ProductSummary>,
) -> Resolution {
    debug!(
        event_name = "chat.resolver.tier_hit",
        correlation_id = %request.correlation_id,
        tier = tier.as_str(),
        product_count = products.len(),
        "product resolved"
    );
    Resolution { products, tier: Some(tier) }
}

fn log_failure(request: &ResolveRequest<'_>, tier: ResolverTier, failure: &CollaboratorError) {
    if matches!(failure, CollaboratorError::InvalidRecord { .. }) {
        error!(
            event_name = "chat.resolver.lookup_failed",
            correlation_id = %request.correlation_id,
            tier = tier.as_str(),
            reason_code = failure.reason_code(),
            error = %failure,
            "catalog returned a malformed record; tier skipped"
        );
    } else {
        warn!(
            event_name = "chat.resolver.lookup_failed",
            correlation_id = %request.correlation_id,
            tier = tier.as_str(),
            reason_code = failure.reason_code(),
            error = %failure,
            "catalog lookup failed; tier skipped"
        );
    }
}

fn is_assistant_line(line: &&str) -> bool {
    let lowered = line.trim().to_lowercase();
    ASSISTANT_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix))
}
