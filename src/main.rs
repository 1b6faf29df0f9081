use std::sync::Arc;

use dotenv::dotenv;
use history_quiz_bot::{
    bot,
    config::{Config, StoreConfig},
    quiz::{
        engine::{QuizEngine, ReloadPolicy},
        registry::InMemoryRegistry,
        store::{JsonFileStore, MongoStore, QuestionStore},
    },
};
use teloxide::prelude::*;

#[tokio::main]
async fn main() {
    // A missing .env is fine as long as the variables come from the environment
    dotenv().ok();

    pretty_env_logger::init();
    log::info!("Starting quiz bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn QuestionStore> = match &config.store {
        StoreConfig::Mongo {
            uri,
            database,
            collection,
        } => {
            let store = match MongoStore::new(uri, database, collection).await {
                Ok(store) => store,
                Err(e) => {
                    log::error!("Invalid MongoDB settings: {}", e);
                    std::process::exit(1);
                }
            };
            match store.ping().await {
                Ok(()) => log::info!(
                    "Connected to MongoDB - database: {}, collection: {}",
                    database,
                    collection
                ),
                // The bot keeps running; quizzes report no questions until the store is back
                Err(e) => log::error!("Could not connect to MongoDB: {}", e),
            }
            Arc::new(store)
        }
        StoreConfig::File(path) => {
            log::info!("Reading questions from '{}'", path.display());
            Arc::new(JsonFileStore::new(path.clone()))
        }
    };

    let engine = Arc::new(QuizEngine::new(
        store,
        Arc::new(InMemoryRegistry::new()),
        config.reload_policy,
    ));
    if engine.policy() == ReloadPolicy::AtStartup {
        let questions = engine.load_questions().await;
        if questions.is_empty() {
            log::warn!("No valid questions loaded at startup, every quiz will be empty");
        } else {
            log::info!("Preloaded {} questions", questions.len());
        }
    }

    let bot = Bot::from_env();
    bot::run(bot, engine).await;
}
