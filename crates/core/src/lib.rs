//! Domain model, keyword taxonomy, intent classification and collaborator ports for the
//! shop chat assistant.

pub mod classifier;
pub mod config;
pub mod domain;
pub mod errors;
pub mod memo;
pub mod ports;
pub mod taxonomy;

pub use classifier::{
    classify_intent, product_subtype, Classification, IntentClassifier, ProductSubtype,
};
pub use domain::context::{ChatContext, UserIntent};
pub use domain::conversation::{ConversationId, ConversationMessage, MessageRole, MessageSource};
pub use domain::product::{OwnerScope, Product, ProductId, ProductSummary};
pub use domain::qa::{QaId, QaMatch, QaMatchKind, QaRecord};
pub use domain::response::{
    ChatReply, FallbackReason, ReplySource, ResponseDetail, ResponseMetadata, Usage,
};
pub use errors::{Collaborator, CollaboratorError};
pub use ports::{CatalogStore, ConversationStore, QaStore, ResponseCache};
pub use taxonomy::{KeywordCategory, KeywordTaxonomy, SynonymCluster};
