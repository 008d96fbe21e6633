//! Sign in, show the alert feed and poll the unread badge
//!
//! Reuses a persisted session when there is one; otherwise logs in with
//! VIGIL_USERNAME / VIGIL_PASSWORD. Backend and credential location come
//! from the VIGIL_* variables read by `ClientConfig::from_env`.
//!
//! Run with: cargo run -p vigil-sdk --example feed_watch

use std::time::Duration;

use vigil_sdk::{init_logging_from_env, SdkError, VigilSystem};

const POLLS: usize = 3;

#[tokio::main]
async fn main() -> Result<(), SdkError> {
    if let Err(e) = init_logging_from_env() {
        eprintln!("Logging disabled: {}", e);
    }

    println!("Vigil SDK - Alert Feed Example");
    println!("==============================");

    let system = VigilSystem::from_env()?;
    println!("Backend: {}", system.config().base_url);

    if system.restore_session() {
        println!("Restored session for {}", system.session().session().username().unwrap_or("?"));
    } else {
        let (Ok(username), Ok(password)) = (std::env::var("VIGIL_USERNAME"), std::env::var("VIGIL_PASSWORD")) else {
            println!("No saved session. Set VIGIL_USERNAME and VIGIL_PASSWORD to log in.");
            return Ok(());
        };
        println!("Logging in as {}...", username);
        system.session().login(&username, &password).await?;
    }

    let store = system.event_store()?;
    let _badge = store.subscribe(|feed| {
        if !feed.is_loading() {
            println!("   [badge] {} unread", feed.unread_count());
        }
    });

    match store.refresh_current().await {
        Ok(()) => {}
        Err(e) if e.is_auth() => {
            println!("Session expired, log in again");
            return Ok(());
        }
        Err(e) => println!("Refresh incomplete: {}", e),
    }

    let feed = store.feed();
    println!("\n{} of {} events cached:", feed.events().len(), feed.total_count());
    for event in feed.events().iter().take(10) {
        println!(
            "   {} #{} {} ({:.0}%){}",
            event.timestamp().format("%Y-%m-%d %H:%M"),
            event.id(),
            event.event_type(),
            event.confidence() * 100.0,
            if event.is_read() { "" } else { " *" }
        );
    }

    if let Some(stats) = feed.statistics() {
        println!("\nLast {} days: {} events", store.config().statistics_days, stats.total_events);
        for (event_type, count) in &stats.by_type {
            println!("   {}: {}", event_type, count);
        }
    }

    if let Some(user_id) = system.session().user_id() {
        println!("\nPolling unread count...");
        for _ in 0..POLLS {
            tokio::time::sleep(Duration::from_secs(10)).await;
            if store.fetch_unread_count_only(user_id).await.is_none() {
                println!("   poll failed");
            }
        }
    }

    Ok(())
}
