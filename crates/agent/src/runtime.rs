use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use shopchat_core::classifier::IntentClassifier;
use shopchat_core::config::AppConfig;
use shopchat_core::domain::context::ChatContext;
use shopchat_core::domain::conversation::{render_history, ConversationId, MessageRole, MessageSource};
use shopchat_core::domain::product::OwnerScope;
use shopchat_core::domain::qa::{QaMatch, QaMatchKind};
use shopchat_core::domain::response::{
    ChatReply, FallbackReason, ReplySource, ResponseDetail, ResponseMetadata, Usage,
    GENERATED_CONFIDENCE,
};
use shopchat_core::errors::CollaboratorError;
use shopchat_core::ports::{CatalogStore, ConversationStore, QaStore, ResponseCache};
use shopchat_core::taxonomy::{KeywordCategory, KeywordTaxonomy};
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapter::{AdaptMethod, AdaptRequest, AnswerAdapter};
use crate::canned::CannedAnswerMatcher;
use crate::context::{ContextBuilder, ContextParts, MessageAnalysis};
use crate::fallback::FallbackGenerator;
use crate::guardrails::{GuardrailDecision, ResponseGuard};
use crate::llm::{Completion, CompletionParams, LlmClient, TimeoutLlmClient};
use crate::memo::Memoizer;
use crate::prompt::PromptAssembler;
use crate::resolver::{ProductResolver, ResolveRequest};

/// Stored messages used to rebuild history when the caller sends none.
pub const HISTORY_MESSAGE_LIMIT: usize = 10;
const SEED_TITLE_CHARS: usize = 50;

/// Collaborators the runtime talks to. Conversation persistence and the response cache are
/// optional.
pub struct RuntimeDeps {
    pub catalog: Arc<dyn CatalogStore>,
    pub qa_store: Arc<dyn QaStore>,
    pub conversations: Option<Arc<dyn ConversationStore>>,
    pub cache: Option<Arc<dyn ResponseCache>>,
    pub llm: Arc<dyn LlmClient>,
}

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<ConversationId>,
    /// Newline-delimited prior turns. Rebuilt from the conversation store when absent.
    pub history: Option<String>,
    pub page_slug: Option<String>,
    pub owner_scope: Option<OwnerScope>,
    pub correlation_id: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            history: None,
            page_slug: None,
            owner_scope: None,
            correlation_id: format!("req-{}", Uuid::new_v4()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatOutcome {
    pub conversation_id: Option<ConversationId>,
    pub reply: ChatReply,
    pub context: ChatContext,
    /// Set when the exchange could not be stored; the reply is still valid.
    pub persistence_error: Option<CollaboratorError>,
}

pub struct AgentRuntime {
    builder: ContextBuilder,
    resolver: ProductResolver,
    canned: CannedAnswerMatcher,
    adapter: AnswerAdapter,
    assembler: PromptAssembler,
    guard: ResponseGuard,
    fallback: FallbackGenerator,
    memo: Memoizer,
    llm: Arc<dyn LlmClient>,
    params: CompletionParams,
    conversations: Option<Arc<dyn ConversationStore>>,
    default_owner: Option<OwnerScope>,
}

impl AgentRuntime {
    /// Wires the pipeline. The generative client is wrapped with the configured timeout.
    pub fn new(deps: RuntimeDeps, config: &AppConfig) -> Self {
        let taxonomy = KeywordTaxonomy::standard();
        let params = CompletionParams::from_config(&config.llm);
        let llm: Arc<dyn LlmClient> = Arc::new(TimeoutLlmClient::new(
            deps.llm,
            Duration::from_secs(config.llm.timeout_secs),
        ));

        Self {
            builder: ContextBuilder::new(IntentClassifier::new(taxonomy)),
            resolver: ProductResolver::new(deps.catalog, taxonomy),
            canned: CannedAnswerMatcher::new(deps.qa_store),
            adapter: AnswerAdapter::new(Some(llm.clone()), params),
            assembler: PromptAssembler::from_config(&config.assistant),
            guard: ResponseGuard,
            fallback: FallbackGenerator::from_config(&config.assistant),
            memo: Memoizer::from_config(deps.cache, &config.cache),
            llm,
            params,
            conversations: deps.conversations,
            default_owner: config.assistant.owner_scope.clone().map(OwnerScope),
        }
    }

    pub async fn handle_message(&self, request: ChatRequest) -> ChatOutcome {
        let correlation_id = request.correlation_id.as_str();
        let owner = request.owner_scope.clone().or_else(|| self.default_owner.clone());
        info!(
            event_name = "chat.message.received",
            correlation_id = %correlation_id,
            conversation_id = request.conversation_id.as_ref().map_or("", |id| id.0.as_str()),
            message_chars = request.message.chars().count(),
            "handling customer message"
        );

        let history = self.resolve_history(&request).await;
        let analysis = self.builder.analyze(&request.message, correlation_id);

        let (reply, context) = if let Some(category) = analysis.pure_social() {
            let context = self.builder.build(
                &analysis,
                ContextParts { history, page_slug: request.page_slug.clone(), ..Default::default() },
            );
            let reply = self.answer_social(category, &context, &request.message, correlation_id).await;
            (reply, context)
        } else {
            let canned = if analysis.skips_canned_lookup() {
                None
            } else {
                self.canned.find(&request.message, owner.as_ref(), correlation_id).await
            };

            match canned {
                Some(qa_match) => {
                    let qa_match =
                        self.adapt_canned(qa_match, &request.message, &analysis, correlation_id).await;
                    let context = self.builder.build(
                        &analysis,
                        ContextParts {
                            history,
                            page_slug: request.page_slug.clone(),
                            qa_match: Some(qa_match.clone()),
                            ..Default::default()
                        },
                    );
                    (canned_reply(&context, &qa_match), context)
                }
                None => {
                    let resolution = self
                        .resolver
                        .resolve(&ResolveRequest {
                            text: &request.message,
                            history: &history,
                            page_slug: request.page_slug.as_deref(),
                            search_keyword: analysis.search_keyword.as_deref(),
                            owner: owner.as_ref(),
                            correlation_id,
                        })
                        .await;
                    let context = self.builder.build(
                        &analysis,
                        ContextParts {
                            history,
                            page_slug: request.page_slug.clone(),
                            products: resolution.products,
                            qa_match: None,
                        },
                    );
                    let reply = self.answer_generated(&context, &request.message, correlation_id).await;
                    (reply, context)
                }
            }
        };

        let (conversation_id, persistence_error) =
            self.persist(&request, owner.as_ref(), &reply).await;
        info!(
            event_name = "chat.reply.ready",
            correlation_id = %correlation_id,
            conversation_id = conversation_id.as_ref().map_or("", |id| id.0.as_str()),
            source = ?reply.source,
            confidence = reply.confidence,
            fallback = reply.metadata.fallback,
            "reply ready"
        );

        ChatOutcome { conversation_id, reply, context, persistence_error }
    }

    async fn resolve_history(&self, request: &ChatRequest) -> String {
        if let Some(history) = &request.history {
            return history.clone();
        }
        let (Some(store), Some(conversation_id)) = (&self.conversations, &request.conversation_id)
        else {
            return String::new();
        };
        match store.recent_messages(conversation_id, HISTORY_MESSAGE_LIMIT).await {
            Ok(messages) => render_history(&messages),
            Err(failure) => {
                warn!(
                    event_name = "chat.history.unavailable",
                    correlation_id = %request.correlation_id,
                    conversation_id = %conversation_id.0,
                    reason_code = failure.reason_code(),
                    error = %failure,
                    "conversation history unavailable; continuing without it"
                );
                String::new()
            }
        }
    }

    async fn answer_social(
        &self,
        category: KeywordCategory,
        context: &ChatContext,
        message: &str,
        correlation_id: &str,
    ) -> ChatReply {
        let prompt = self.assembler.assemble_social(category, message);
        match self.generate(&prompt, correlation_id).await {
            Ok(completion) => generated_reply(context, completion.text, Some(completion.usage), false, true),
            Err(reason) => self.fallback_reply(context, reason, correlation_id),
        }
    }

    async fn answer_generated(
        &self,
        context: &ChatContext,
        message: &str,
        correlation_id: &str,
    ) -> ChatReply {
        let prompt = self.assembler.assemble(context, message);
        if let Some(text) = self.memo.lookup(&prompt, correlation_id).await {
            return generated_reply(context, text, None, true, false);
        }

        match self.generate(&prompt, correlation_id).await {
            Ok(completion) => {
                self.memo.store(&prompt, &completion.text, correlation_id).await;
                generated_reply(context, completion.text, Some(completion.usage), false, false)
            }
            Err(reason) => self.fallback_reply(context, reason, correlation_id),
        }
    }

    /// One generative call followed by the guard. No retry.
    async fn generate(&self, prompt: &str, correlation_id: &str) -> Result<Completion, FallbackReason> {
        let system_prompt = self.assembler.system_prompt();
        let completion = match self.llm.complete(&system_prompt, prompt, &self.params).await {
            Ok(completion) => completion,
            Err(failure) => {
                warn!(
                    event_name = "chat.generative.failed",
                    correlation_id = %correlation_id,
                    reason_code = failure.reason_code(),
                    error = %failure,
                    "generative call failed"
                );
                return Err(FallbackReason::GenerativeFailure {
                    reason_code: failure.reason_code().to_string(),
                });
            }
        };

        let text = completion.text.trim().to_string();
        match self.guard.evaluate(&text) {
            GuardrailDecision::Allow => Ok(Completion { text, usage: completion.usage }),
            GuardrailDecision::Deny { reason_code } => {
                warn!(
                    event_name = "chat.guard.rejected",
                    correlation_id = %correlation_id,
                    reason_code,
                    "generated reply rejected"
                );
                Err(FallbackReason::Rejected { reason_code: reason_code.to_string() })
            }
        }
    }

    fn fallback_reply(
        &self,
        context: &ChatContext,
        reason: FallbackReason,
        correlation_id: &str,
    ) -> ChatReply {
        info!(
            event_name = "chat.fallback.used",
            correlation_id = %correlation_id,
            intent = context.user_intent.as_str(),
            reason_code = reason.reason_code(),
            "templated fallback reply used"
        );
        ChatReply::fallback(
            self.fallback.generate(context),
            context.user_intent,
            context.question_categories.clone(),
            reason,
        )
    }

    /// Contained matches may differ from the stored question in numbers or named items, so
    /// they go through the adapter; exact matches are reused verbatim.
    async fn adapt_canned(
        &self,
        mut qa_match: QaMatch,
        message: &str,
        analysis: &MessageAnalysis,
        correlation_id: &str,
    ) -> QaMatch {
        if qa_match.metadata.kind != QaMatchKind::Contains {
            return qa_match;
        }
        let outcome = self
            .adapter
            .adapt(
                &AdaptRequest {
                    question: message,
                    example_question: &qa_match.metadata.matched_question,
                    example_answer: &qa_match.answer,
                    categories: &analysis.classification.categories,
                },
                correlation_id,
            )
            .await;
        if outcome.method != AdaptMethod::Reused {
            qa_match.answer = outcome.answer;
            qa_match.metadata.adapted = true;
        }
        qa_match
    }

    async fn persist(
        &self,
        request: &ChatRequest,
        owner: Option<&OwnerScope>,
        reply: &ChatReply,
    ) -> (Option<ConversationId>, Option<CollaboratorError>) {
        let Some(store) = &self.conversations else {
            return (request.conversation_id.clone(), None);
        };

        let conversation_id = match &request.conversation_id {
            Some(conversation_id) => conversation_id.clone(),
            None => match store.create_conversation(&seed_title(&request.message), owner).await {
                Ok(conversation_id) => conversation_id,
                Err(failure) => {
                    log_persistence_failure(&request.correlation_id, None, &failure);
                    return (None, Some(failure));
                }
            },
        };

        let stored = async {
            store
                .append_message(
                    &conversation_id,
                    MessageRole::User,
                    &request.message,
                    MessageSource::Customer,
                    json!({ "correlation_id": request.correlation_id }),
                )
                .await?;
            store
                .append_message(
                    &conversation_id,
                    MessageRole::Assistant,
                    &reply.text,
                    reply.source.as_message_source(),
                    serde_json::to_value(&reply.metadata).unwrap_or_default(),
                )
                .await
        }
        .await;

        match stored {
            Ok(()) => (Some(conversation_id), None),
            Err(failure) => {
                log_persistence_failure(&request.correlation_id, Some(&conversation_id), &failure);
                (Some(conversation_id), Some(failure))
            }
        }
    }
}

fn canned_reply(context: &ChatContext, qa_match: &QaMatch) -> ChatReply {
    ChatReply {
        text: qa_match.answer.clone(),
        source: ReplySource::QaMatch,
        confidence: qa_match.confidence,
        metadata: ResponseMetadata {
            fallback: false,
            intent: context.user_intent,
            categories: context.question_categories.clone(),
            detail: ResponseDetail::CannedAnswer {
                qa_id: qa_match.metadata.qa_id.clone(),
                matched_question: qa_match.metadata.matched_question.clone(),
                match_kind: qa_match.metadata.kind,
                adapted: qa_match.metadata.adapted,
            },
        },
    }
}

fn generated_reply(
    context: &ChatContext,
    text: String,
    usage: Option<Usage>,
    cache_hit: bool,
    pure_social: bool,
) -> ChatReply {
    ChatReply {
        text,
        source: ReplySource::Generated,
        confidence: GENERATED_CONFIDENCE,
        metadata: ResponseMetadata {
            fallback: false,
            intent: context.user_intent,
            categories: context.question_categories.clone(),
            detail: ResponseDetail::Generated {
                product_ids: context.current_products.iter().map(|product| product.id.clone()).collect(),
                search_keyword: context.search_keyword.clone(),
                usage,
                cache_hit,
                pure_social,
            },
        },
    }
}

fn seed_title(message: &str) -> String {
    message.trim().chars().take(SEED_TITLE_CHARS).collect()
}

fn log_persistence_failure(
    correlation_id: &str,
    conversation_id: Option<&ConversationId>,
    failure: &CollaboratorError,
) {
    warn!(
        event_name = "chat.persistence.failed",
        correlation_id = %correlation_id,
        conversation_id = conversation_id.map_or("", |id| id.0.as_str()),
        reason_code = failure.reason_code(),
        error = %failure,
        "failed to store exchange"
    );
}
