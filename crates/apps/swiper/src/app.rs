//! Root application for the swiper terminal front end
//!
//! Wires the session core once at startup and prints its observables to
//! stdout as they change.

use std::sync::Arc;

use anyhow::Result;
use deck::{
    BackgroundTasks, ConnectivityFlag, DeckItem, DurableStore, HttpRemoteSession,
    IdentityProvider, InMemoryStore, SessionEngine, SessionStatus, SqliteStore, SwiperConfig,
    format_countdown,
};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::input::{self, Command};

/// Root application state
pub struct SwiperApp {
    engine: SessionEngine,
    connectivity: Arc<ConnectivityFlag>,
    background: Option<BackgroundTasks>,
}

impl SwiperApp {
    pub fn new(settings: SwiperConfig) -> Self {
        let store = open_store(&settings);
        let remote = Arc::new(HttpRemoteSession::new(
            settings.api_base_url.clone(),
            settings.request_timeout(),
        ));
        let identity = Arc::new(IdentityProvider::new(store.clone()));
        let connectivity = Arc::new(ConnectivityFlag::default());

        info!("Using deck API at {}", remote.base_url());
        let engine = SessionEngine::new(settings, store, remote, identity, connectivity.clone());
        subscribe_printers(&engine);

        Self {
            engine,
            connectivity,
            background: None,
        }
    }

    /// Start the session and handle commands until quit or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.engine.start().await;
        self.background = Some(self.engine.spawn_background());
        println!("{}", input::help_text());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match input::parse(&line) {
                Some(Command::Quit) => break,
                Some(command) => self.handle(command).await,
                None => println!("{}", input::help_text()),
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Like => {
                self.engine.like().await;
            }
            Command::Dislike => {
                self.engine.dislike().await;
            }
            Command::Reload => self.engine.request_reload().await,
            Command::RefreshQuota => self.engine.refresh_quota().await,
            Command::Status => self.print_status(),
            Command::GoOffline => {
                self.connectivity.set_online(false);
                println!("Offline: actions will be queued");
            }
            Command::GoOnline => {
                self.connectivity.set_online(true);
                if let Some(background) = &self.background {
                    background.notify_online();
                }
                println!("Online");
            }
            Command::Help => println!("{}", input::help_text()),
            Command::Quit => {}
        }
    }

    fn print_status(&self) {
        let view = self.engine.view();
        let quota = view.quota.get();
        let snapshot = self.engine.snapshot();

        println!(
            "Status: {} | {}/{} seen | {} of {} actions left | {} liked | {} queued | resets in {}",
            view.status.get(),
            snapshot.cursor,
            snapshot.deck.len(),
            quota.remaining,
            quota.daily_limit,
            view.liked.get().len(),
            self.engine.queue().pending_count(),
            format_countdown(view.countdown.get()),
        );
        if let Some(identity) = view.identity.get() {
            println!("Device: {}", identity);
        }
    }

    async fn shutdown(&mut self) {
        if let Some(background) = self.background.take() {
            background.shutdown().await;
        }
        if self.engine.queue().has_pending() {
            warn!(
                "{} actions still queued; they will be sent next time",
                self.engine.queue().pending_count()
            );
        }
    }
}

/// Open the on-disk store, or fall back to memory for this run only
fn open_store(settings: &SwiperConfig) -> Arc<dyn DurableStore> {
    let Some(path) = settings.database_path() else {
        warn!("No config directory; progress will not be saved");
        return Arc::new(InMemoryStore::new());
    };

    match SqliteStore::new(&path) {
        Ok(store) => {
            info!("Opened store at {}", path.display());
            Arc::new(store)
        }
        Err(e) => {
            warn!("Failed to open store, progress will not be saved: {:#}", e);
            Arc::new(InMemoryStore::new())
        }
    }
}

fn subscribe_printers(engine: &SessionEngine) {
    let view = engine.view();

    view.status.subscribe(|status| match status {
        SessionStatus::Loading => println!("Loading today's deck..."),
        SessionStatus::Ready => {}
        SessionStatus::LimitReached => println!("Daily limit reached. Come back tomorrow!"),
        SessionStatus::Completed => println!("You've seen every item for today."),
        SessionStatus::Error => {}
    });

    view.current_item.subscribe(|item| {
        if let Some(item) = item {
            print_item(item);
        }
    });

    view.error_message.subscribe(|message| {
        if let Some(message) = message {
            println!("{} (press r to retry)", message);
        }
    });

    view.quota.subscribe(|quota| {
        println!("{} of {} actions left today", quota.remaining, quota.daily_limit);
    });
}

fn print_item(item: &DeckItem) {
    println!();
    println!("{} - {} [{}]", item.symbol, item.name, item.sector);
    println!(
        "  price {:.2}  dividend yield {:.2}%",
        item.price, item.dividend_yield
    );
    if !item.description.is_empty() {
        println!("  {}", item.description);
    }
    println!("  l = like, d = dislike");
}
