use chirp_client::{
    config::{ConfigError, PreviewConfig},
    memory::InMemoryPosts,
    notify::LogNotifier,
    page::Home,
    session::MemorySession,
    view::Markup,
};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirp_client=debug,chirp_common=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn get_config() -> Result<PreviewConfig, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    Ok(PreviewConfig::from_env()?)
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = get_config()?;

    let posts = Arc::new(InMemoryPosts::with_feed(config.load_feed()?));
    let session = config.session()?;
    if let Some(user) = &session.user {
        posts.add_author(user.to_author());
        posts.act_as(Some(user.id.clone()));
    }

    let home = Home::new(
        Arc::new(MemorySession::new(session, None)),
        posts,
        Arc::new(LogNotifier),
    );
    home.mount().await;

    if let Some(draft) = &config.draft {
        if let Some(composer) = home.composer() {
            composer.on_change(draft.clone());
            let outcome = composer.submit().await;
            info!(?outcome, "Submitted draft");
        } else {
            info!("Not signed in, skipping draft");
        }
    }

    println!("{}", Markup(&home.view(OffsetDateTime::now_utc())));

    Ok(())
}
