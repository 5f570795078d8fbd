//! Process configuration read from the environment

use crate::bot::BotSettings;
use crate::nlu::NluConfig;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// Recipe file to load instead of the bundled catalog
    pub catalog_path: Option<PathBuf>,
    /// Pause between consecutive replies of one turn
    pub reply_delay: Duration,
    pub nlu: NluConfig,
    pub bot: BotSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let nlu = NluConfig::from_env();
        let bot = BotSettings::from_env(&nlu);

        let db_path = std::env::var("RECIPE_BOT_DB_PATH").map_or_else(
            |_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".recipe-bot").join("recipe_bot.db")
            },
            PathBuf::from,
        );

        Self {
            port: std::env::var("RECIPE_BOT_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            db_path,
            catalog_path: std::env::var("RECIPE_BOT_CATALOG").ok().map(PathBuf::from),
            reply_delay: std::env::var("RECIPE_BOT_REPLY_DELAY_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map_or(Duration::ZERO, Duration::from_millis),
            nlu,
            bot,
        }
    }
}
