//! Static keyword taxonomy and synonym-expansion table.
//!
//! Both tables are compiled-in configuration: read-only, shared by reference and safe for any
//! number of concurrent readers. Membership is case-insensitive substring containment with no
//! tokenization or stemming, so short phrases carry a deliberate false-positive risk.

mod keywords;
mod synonyms;

use serde::{Deserialize, Serialize};

/// Coarse topic tags a customer message may carry. Declaration order is the order in which
/// detected categories are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    Product,
    Price,
    Purchase,
    Shipping,
    Return,
    Size,
    Style,
    Advice,
    Feature,
    Material,
    Color,
    Stock,
    Care,
    ProductCare,
    Policy,
    Promotion,
    Account,
    FollowUp,
    Greeting,
    Thanks,
    Goodbye,
    WorkingHours,
    Location,
    Trust,
    Payment,
    Delivery,
    Exchange,
    Warranty,
    OrderStatus,
    Complaint,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 30] = [
        Self::Product,
        Self::Price,
        Self::Purchase,
        Self::Shipping,
        Self::Return,
        Self::Size,
        Self::Style,
        Self::Advice,
        Self::Feature,
        Self::Material,
        Self::Color,
        Self::Stock,
        Self::Care,
        Self::ProductCare,
        Self::Policy,
        Self::Promotion,
        Self::Account,
        Self::FollowUp,
        Self::Greeting,
        Self::Thanks,
        Self::Goodbye,
        Self::WorkingHours,
        Self::Location,
        Self::Trust,
        Self::Payment,
        Self::Delivery,
        Self::Exchange,
        Self::Warranty,
        Self::OrderStatus,
        Self::Complaint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Price => "price",
            Self::Purchase => "purchase",
            Self::Shipping => "shipping",
            Self::Return => "return",
            Self::Size => "size",
            Self::Style => "style",
            Self::Advice => "advice",
            Self::Feature => "feature",
            Self::Material => "material",
            Self::Color => "color",
            Self::Stock => "stock",
            Self::Care => "care",
            Self::ProductCare => "product_care",
            Self::Policy => "policy",
            Self::Promotion => "promotion",
            Self::Account => "account",
            Self::FollowUp => "follow_up",
            Self::Greeting => "greeting",
            Self::Thanks => "thanks",
            Self::Goodbye => "goodbye",
            Self::WorkingHours => "working_hours",
            Self::Location => "location",
            Self::Trust => "trust",
            Self::Payment => "payment",
            Self::Delivery => "delivery",
            Self::Exchange => "exchange",
            Self::Warranty => "warranty",
            Self::OrderStatus => "order_status",
            Self::Complaint => "complaint",
        }
    }

    /// Vietnamese label used inside generated instructions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Product => "sản phẩm",
            Self::Price => "giá cả",
            Self::Purchase => "mua hàng",
            Self::Shipping => "vận chuyển",
            Self::Return => "đổi trả",
            Self::Size => "kích cỡ",
            Self::Style => "phong cách",
            Self::Advice => "tư vấn",
            Self::Feature => "đặc điểm",
            Self::Material => "chất liệu",
            Self::Color => "màu sắc",
            Self::Stock => "tình trạng hàng",
            Self::Care => "giặt ủi",
            Self::ProductCare => "độ bền và bảo quản",
            Self::Policy => "chính sách",
            Self::Promotion => "khuyến mãi",
            Self::Account => "tài khoản",
            Self::FollowUp => "hỏi tiếp",
            Self::Greeting => "chào hỏi",
            Self::Thanks => "cảm ơn",
            Self::Goodbye => "tạm biệt",
            Self::WorkingHours => "giờ làm việc",
            Self::Location => "địa chỉ",
            Self::Trust => "uy tín",
            Self::Payment => "thanh toán",
            Self::Delivery => "giao hàng",
            Self::Exchange => "đổi hàng",
            Self::Warranty => "bảo hành",
            Self::OrderStatus => "đơn hàng",
            Self::Complaint => "khiếu nại",
        }
    }

    pub fn is_social(&self) -> bool {
        matches!(self, Self::Greeting | Self::Thanks | Self::Goodbye)
    }

    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Self::Shipping
                | Self::Return
                | Self::Policy
                | Self::Promotion
                | Self::Account
                | Self::WorkingHours
                | Self::Location
                | Self::Trust
                | Self::Payment
                | Self::Delivery
                | Self::Exchange
                | Self::Warranty
                | Self::OrderStatus
                | Self::Complaint
        )
    }

    pub fn is_product(&self) -> bool {
        matches!(
            self,
            Self::Product
                | Self::Price
                | Self::Purchase
                | Self::Size
                | Self::Style
                | Self::Advice
                | Self::Feature
                | Self::Material
                | Self::Color
                | Self::Stock
                | Self::Care
                | Self::ProductCare
                | Self::FollowUp
        )
    }
}

/// Canonical product concept with its related search terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynonymCluster {
    pub canonical: &'static str,
    pub synonyms: &'static [&'static str],
}

impl SynonymCluster {
    /// Every search term of the cluster except `keyword` itself, canonical first.
    pub fn expansion_for(&self, keyword: &str) -> Vec<String> {
        std::iter::once(self.canonical)
            .chain(self.synonyms.iter().copied())
            .filter(|term| *term != keyword)
            .map(str::to_string)
            .collect()
    }
}

/// One matched phrase and the category it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhraseHit {
    pub category: KeywordCategory,
    pub phrase: &'static str,
}

pub struct KeywordTaxonomy {
    categories: &'static [(KeywordCategory, &'static [&'static str])],
    clusters: &'static [SynonymCluster],
    generic_product_phrases: &'static [&'static str],
}

static STANDARD: KeywordTaxonomy = KeywordTaxonomy {
    categories: keywords::CATEGORY_PHRASES,
    clusters: synonyms::SYNONYM_CLUSTERS,
    generic_product_phrases: keywords::GENERIC_PRODUCT_PHRASES,
};

impl KeywordTaxonomy {
    /// The compiled-in taxonomy shared by every request.
    pub fn standard() -> &'static KeywordTaxonomy {
        &STANDARD
    }

    pub fn phrases(&self, category: KeywordCategory) -> &'static [&'static str] {
        self.categories
            .iter()
            .find(|(candidate, _)| *candidate == category)
            .map(|(_, phrases)| *phrases)
            .unwrap_or(&[])
    }

    /// Scans `text` for every category phrase, in category declaration order and phrase
    /// order within a category.
    pub fn scan(&self, text: &str) -> Vec<PhraseHit> {
        let haystack = padded_lowercase(text);
        let mut hits = Vec::new();
        for category in KeywordCategory::ALL {
            for phrase in self.phrases(category) {
                if haystack.contains(phrase) {
                    hits.push(PhraseHit { category, phrase });
                }
            }
        }
        hits
    }

    /// First concrete product phrase contained in `text`; generic words such as "sản phẩm"
    /// are not usable as catalog search keywords.
    pub fn first_product_keyword(&self, text: &str) -> Option<&'static str> {
        let haystack = padded_lowercase(text);
        self.phrases(KeywordCategory::Product)
            .iter()
            .copied()
            .filter(|phrase| !self.generic_product_phrases.contains(phrase))
            .find(|phrase| haystack.contains(phrase))
            .map(str::trim)
    }

    /// Bidirectional containment lookup; the first cluster whose canonical term or any synonym
    /// contains, or is contained in, `keyword` wins.
    pub fn cluster_for(&self, keyword: &str) -> Option<&'static SynonymCluster> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return None;
        }
        let related = |term: &str| term.contains(keyword.as_str()) || keyword.contains(term);
        self.clusters.iter().find(|cluster| {
            related(cluster.canonical) || cluster.synonyms.iter().any(|term| related(term))
        })
    }

    pub fn expand(&self, keyword: &str) -> Vec<String> {
        self.cluster_for(keyword)
            .map(|cluster| cluster.expansion_for(keyword.trim()))
            .unwrap_or_default()
    }
}

/// Lowercases and pads with spaces so phrases such as `" hi "` can anchor on word edges.
pub(crate) fn padded_lowercase(text: &str) -> String {
    format!(" {} ", text.to_lowercase())
}
