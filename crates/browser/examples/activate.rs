//! Show the reader overlay on the first open tab
//!
//! Start Chrome with `--remote-debugging-port=9222`, open an article, then:
//!
//! ```text
//! RUST_LOG=debug cargo run -p termview-browser --example activate -- ws://localhost:9222/devtools/browser/<id>
//! ```

use browser::{HostConfig, ReaderEvent, ReaderHost};
use termview::Assembly;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = HostConfig::default();
    if let Some(url) = std::env::args().nth(1) {
        config.cdp_url = url;
    }

    let host = ReaderHost::connect(config).await?;
    let mut events = host.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ReaderEvent::Failed { target_id, error } = &event {
                eprintln!("{}: {}", target_id, error);
            } else {
                println!("event: {:?}", event);
            }
        }
    });

    let target = host
        .page_targets()
        .await?
        .into_iter()
        .next()
        .ok_or("no open page")?;

    match host.activate(&target).await? {
        Assembly::Assembled(output) => {
            println!("Title:  {}", output.title);
            println!("Byline: {}", output.byline.as_deref().unwrap_or("-"));
            println!("Nodes:  {}", output.body.len());
        }
        Assembly::AlreadyShown => println!("Overlay already shown"),
    }

    // Second activation is a no-op while the overlay is up
    let again = host.activate(&target).await?;
    println!("Second activation: {:?}", again == Assembly::AlreadyShown);

    tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    host.dismiss(&target).await?;
    host.close().await?;
    Ok(())
}
