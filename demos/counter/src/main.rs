//! Counter example binary
//!
//! Drives the counter store the way a view would: a printer subscribed to
//! distinct states and a few button presses, including one at zero that
//! makes the label flash.

use counter::{build_store, Action, UserAction};
use foldstore_runtime::{StoreConfig, StoreError, StoreStatus};
use futures::StreamExt;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), StoreError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,foldstore_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Example: foldstore ===\n");

    let (state, dispatcher) = build_store(StoreConfig::new().with_name("counter"))?.into_parts();
    let buttons = dispatcher.map_action(Action::User);
    drop(dispatcher);

    let mut view = state.subscribe().distinct_until_changed();
    let printer = tokio::spawn(async move {
        while let Some(Ok(model)) = view.next().await {
            let highlight = if model.flash { "*" } else { " " };
            println!("[{highlight}{}{highlight}]", model.label());
        }
    });

    for press in [
        UserAction::Increment,
        UserAction::Decrement,
        UserAction::Decrement,
    ] {
        println!("\n>>> Pressing: {press:?}");
        buttons.dispatch(press)?;
        tokio::time::sleep(Duration::from_millis(400)).await;
    }

    // No more presses: the store completes once the flash has finished
    drop(buttons);
    let status = state.closed().await;
    tracing::info!(?status, "Counter store finished");
    if let StoreStatus::Failed(error) = status {
        return Err(error);
    }
    if let Err(error) = printer.await {
        tracing::warn!(error = %error, "State printer task failed");
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
