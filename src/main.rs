use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, FmtSubscriber};

use sidera_graph::config::Config;
use sidera_graph::conversation::{ConversationStore, TurnEvent};
use sidera_graph::generation::GeminiGenerator;
use sidera_graph::graph::{GraphStore, MemoryGraphStore, RestGraphStore, ScatterLayout, TurnFactory};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sidera_graph=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Sidera conversation graph");

    let config = Config::from_env()?;
    info!("Configuration loaded");

    let store: Arc<dyn GraphStore> = match &config.api_base_url {
        Some(base_url) => {
            info!("Using REST storage at {}", base_url);
            Arc::new(RestGraphStore::new(base_url.clone())?)
        }
        None => {
            info!("Using in-memory storage");
            Arc::new(MemoryGraphStore::new())
        }
    };

    let generator = Arc::new(GeminiGenerator::new(&config)?);
    let layout = Arc::new(ScatterLayout::new(config.position_spread));
    let factory = TurnFactory::new(generator, Arc::clone(&store), layout);
    let conversation = ConversationStore::new(factory, store, &config.project_name);

    // Trace turn transitions the way the rendering layer would consume them
    let mut events = conversation.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                TurnEvent::Pending { node } => debug!("Pending {}: {}", node.id, node.answer),
                TurnEvent::Committed { temp_id, node, edge } => debug!(
                    "Committed {} -> {} (edge: {})",
                    temp_id,
                    node.id,
                    edge.is_some()
                ),
                TurnEvent::Failed { temp_id, reason } => {
                    debug!("Failed {}: {}", temp_id, reason)
                }
            }
        }
    });

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Ask the stars. Empty line repeats the prompt, ctrl-d leaves.\n> ")
        .await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }

        match conversation.add_turn(question).await {
            Ok(node) => {
                let reply = format!(
                    "\n{}\n[{} | importance {} | at ({:.1}, {:.1}, {:.1})]\n\n> ",
                    node.answer,
                    if node.keywords.is_empty() {
                        "no keywords".to_string()
                    } else {
                        node.keywords.join(", ")
                    },
                    node.importance,
                    node.position.x,
                    node.position.y,
                    node.position.z
                );
                stdout.write_all(reply.as_bytes()).await?;
            }
            Err(err) => {
                let reply = format!("\nThe turn could not be saved: {}\n\n> ", err);
                stdout.write_all(reply.as_bytes()).await?;
            }
        }
        stdout.flush().await?;
    }

    let title = conversation.title().await;
    let nodes = conversation.nodes().await;
    let edges = conversation.edges().await;
    info!(
        "Leaving '{}' with {} nodes and {} edges",
        title,
        nodes.len(),
        edges.len()
    );

    Ok(())
}
