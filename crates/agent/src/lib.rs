//! Chat pipeline for the storefront assistant.
//!
//! One customer message flows through a fixed sequence:
//! 1. **Analysis** (`context`) - keyword classification, coarse intent and search keyword
//! 2. **Canned answers** (`canned`, `adapter`) - stored Q&A, adapted when the customer's
//!    numbers or named items differ from the stored question
//! 3. **Product lookup** (`resolver`) - page slug, slug in text, keyword search, history
//! 4. **Generation** (`prompt`, `llm`, `memo`) - structured prompt, one generative call,
//!    memoized by prompt
//! 5. **Validation** (`guardrails`, `fallback`) - rejected or failed generations get a
//!    deterministic templated reply
//!
//! `runtime::AgentRuntime` wires these together and persists the exchange. The model only
//! phrases answers; prices and product facts always come from the catalog.

pub mod adapter;
pub mod canned;
pub mod context;
pub mod fallback;
pub mod guardrails;
pub mod llm;
pub mod memo;
pub mod prompt;
pub mod resolver;
pub mod runtime;

pub use adapter::{AdaptMethod, AdaptOutcome, AdaptRequest, AnswerAdapter};
pub use guardrails::{GuardrailDecision, ResponseGuard};
pub use llm::{client_from_config, CompletionParams, LlmClient};
pub use runtime::{AgentRuntime, ChatOutcome, ChatRequest, RuntimeDeps};
