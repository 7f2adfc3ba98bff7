//! Swiper - A terminal front end for the daily deck
//!
//! This is the main entry point for the swiper application.

use anyhow::Result;
use deck::SwiperConfig;
use log::{error, warn};

mod app;
mod input;

use app::SwiperApp;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let settings = match SwiperConfig::load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load settings, using defaults: {:#}", e);
            if let Some(path) = SwiperConfig::default_settings_path() {
                warn!("Settings are read from {}", path.display());
            }
            SwiperConfig::default()
        }
    };

    let mut app = SwiperApp::new(settings);
    app.run().await
}
