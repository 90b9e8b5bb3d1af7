use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use plaza_core::PlazaClient;
use plaza_core::composer::{DraftPost, SubmitOutcome};
use plaza_core::post::Post;
use plaza_infrastructure::MemoryBackend;

#[derive(Parser)]
#[command(name = "plaza")]
#[command(about = "Plaza - social feed client demo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the full client lifecycle against the in-memory backend
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => demo().await?,
    }

    Ok(())
}

/// Initialize → sign up → publish → load → toggle → reload, printed at
/// each step.
async fn demo() -> Result<()> {
    let backend = Arc::new(MemoryBackend::new());

    // A neighbour with one liked post, so the live section is not empty.
    let neighbour = backend.seed_account("neighbour@example.com", "secret1").await;
    let sunrise = backend
        .seed_post(
            &neighbour,
            "First sunrise over the plaza",
            "memory://posts/sunrise.jpg",
        )
        .await;
    backend.seed_like(&sunrise, &neighbour.user_id).await;

    let client = PlazaClient::new(backend.clone(), backend.clone(), backend.clone());
    client.initialize().await?;

    let identity = client.session().sign_up("demo@example.com", "secret1").await?;
    println!("signed up as {} ({})\n", identity.email, identity.user_id);

    let mut draft = DraftPost::new();
    draft.caption = "Hello from the demo".to_string();
    draft.attach_image("hello.png", vec![0x89, 0x50, 0x4E, 0x47]);
    match client.composer().submit(&mut draft).await? {
        SubmitOutcome::Published(id) => println!("published post {id}\n"),
        SubmitOutcome::Skipped => println!("draft incomplete, nothing submitted\n"),
    }

    let mut feed = client.load_feed().await;
    println!("feed after publishing:");
    print_feed(&feed);

    if let Some(live) = feed.iter_mut().find(|post| !post.is_seed()) {
        client.interactions().toggle_like(live).await?;
        println!("\ntoggled a like on the newest live post");
    }

    let feed = client.load_feed().await;
    println!("\nfeed after reload:");
    print_feed(&feed);

    Ok(())
}

fn print_feed(feed: &[Post]) {
    for post in feed {
        let card = post.card();
        let origin = if post.is_seed() { "seed" } else { "live" };
        let liked = if card.viewer_has_liked { "*" } else { " " };
        println!(
            "  [{origin}] {liked} {:>4} likes  @{:<12} {}",
            card.like_count, card.author_username, card.caption
        );
    }
}
