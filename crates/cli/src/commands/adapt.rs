use shopchat_agent::adapter::{AdaptRequest, AnswerAdapter};
use shopchat_agent::llm::{client_from_config, CompletionParams};
use shopchat_core::classifier::IntentClassifier;
use shopchat_core::config::LoadOptions;

use crate::commands::{async_runtime, load_config, CommandResult, EXIT_CONFIG};
use crate::AdaptArgs;

pub fn run(args: &AdaptArgs, options: LoadOptions) -> CommandResult {
    let adapter = if args.no_llm {
        AnswerAdapter::offline()
    } else {
        let config = match load_config("adapt", options) {
            Ok(config) => config,
            Err(failure) => return failure,
        };
        match client_from_config(&config.llm) {
            Ok(llm) => AnswerAdapter::new(Some(llm), CompletionParams::from_config(&config.llm)),
            Err(error) => {
                return CommandResult::failure("adapt", "llm_client", format!("{error:#}"), EXIT_CONFIG)
            }
        }
    };
    let runtime = match async_runtime("adapt") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let categories = IntentClassifier::default().classify(&args.question).categories;
    let outcome = runtime.block_on(adapter.adapt(
        &AdaptRequest {
            question: &args.question,
            example_question: &args.example_question,
            example_answer: &args.example_answer,
            categories: &categories,
        },
        "cli-adapt",
    ));

    CommandResult::report("adapt", outcome)
}
