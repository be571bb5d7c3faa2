use std::sync::Arc;

use serde_json::json;
use shopchat_agent::runtime::{AgentRuntime, ChatOutcome, ChatRequest, RuntimeDeps};
use shopchat_agent::llm::client_from_config;
use shopchat_core::config::{AppConfig, LoadOptions};
use shopchat_core::domain::conversation::ConversationId;
use shopchat_core::domain::product::OwnerScope;
use shopchat_db::{
    connect_with_settings, migrations, SqlCatalogRepository, SqlConversationRepository,
    SqlQaRepository, SqlResponseCache,
};
use tracing::info;

use crate::commands::{
    async_runtime, load_config, CommandResult, EXIT_CONFIG, EXIT_DATABASE, EXIT_MIGRATION,
};
use crate::AskArgs;

pub fn run(args: &AskArgs, options: LoadOptions) -> CommandResult {
    let config = match load_config("ask", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match async_runtime("ask") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    match runtime.block_on(ask(args, &config)) {
        Ok(outcome) => CommandResult::report("ask", render_outcome(&outcome)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}

async fn ask(
    args: &AskArgs,
    config: &AppConfig,
) -> Result<ChatOutcome, (&'static str, String, u8)> {
    let llm = client_from_config(&config.llm)
        .map_err(|error| ("llm_client", format!("{error:#}"), EXIT_CONFIG))?;
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), EXIT_DATABASE))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", error.to_string(), EXIT_MIGRATION))?;

    let agent = AgentRuntime::new(
        RuntimeDeps {
            catalog: Arc::new(SqlCatalogRepository::new(pool.clone())),
            qa_store: Arc::new(SqlQaRepository::new(pool.clone())),
            conversations: Some(Arc::new(SqlConversationRepository::new(pool.clone()))),
            cache: Some(Arc::new(SqlResponseCache::new(pool.clone()))),
            llm,
        },
        config,
    );

    let mut request = ChatRequest::new(args.message.clone());
    request.conversation_id = args.conversation_id.clone().map(ConversationId);
    request.page_slug = args.page_slug.clone();
    request.owner_scope = args.owner.clone().map(OwnerScope);
    request.history = args.history.clone();
    info!(
        event_name = "cli.ask.start",
        correlation_id = %request.correlation_id,
        "running chat pipeline"
    );

    let outcome = agent.handle_message(request).await;
    pool.close().await;
    Ok(outcome)
}

fn render_outcome(outcome: &ChatOutcome) -> serde_json::Value {
    json!({
        "conversation_id": outcome.conversation_id.as_ref().map(|id| id.0.as_str()),
        "reply": outcome.reply,
        "products": outcome
            .context
            .current_products
            .iter()
            .map(|product| json!({
                "id": product.id.0,
                "name": product.name,
                "price": product.formatted_price(),
            }))
            .collect::<Vec<_>>(),
        "persistence_error": outcome.persistence_error.as_ref().map(ToString::to_string),
    })
}
