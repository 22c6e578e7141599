//! # Sabia: retrieval-augmented Telegram responder
//!
//! Usage:
//!   sabia                                  # Webhook mode on PORT (default 5000)
//!   sabia --poll                           # Long polling instead of a webhook
//!   sabia --set-webhook https://host/webhook
//!   sabia --config ~/.sabia/config.toml --workers 4 --verbose

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use sabia_agent::{ChatHandler, ResponseAdapter, Responder, WordCloudService};
use sabia_channels::TelegramTransport;
use sabia_core::SabiaConfig;
use sabia_core::traits::{Lookup, Normalizer, Transport};
use sabia_gateway::AppState;
use sabia_knowledge::{KnowledgeIndex, RetrievalEngine, load_entries, seed_corpus};
use sabia_nlp::TextNormalizer;
use sabia_scheduler::{MessageQueue, WorkerPool};
use sabia_tools::{QuickChartRenderer, WebContentExtractor, WikipediaLookup};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

const LOG_TARGETS: &[&str] = &[
    "sabia",
    "sabia_core",
    "sabia_nlp",
    "sabia_knowledge",
    "sabia_providers",
    "sabia_tools",
    "sabia_channels",
    "sabia_scheduler",
    "sabia_agent",
    "sabia_gateway",
];

#[derive(Parser)]
#[command(
    name = "sabia",
    version,
    about = "🐦 Sabia: retrieval-augmented Telegram chat responder"
)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of queue workers (overrides SABIA_WORKERS)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Use Telegram long polling instead of the webhook
    #[arg(long)]
    poll: bool,

    /// Register this public URL with Telegram at startup
    #[arg(long)]
    set_webhook: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON log lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { "info" };
    let mut directives: Vec<String> = LOG_TARGETS.iter().map(|t| format!("{t}={level}")).collect();
    if cli.verbose {
        directives.push("tower_http=debug".into());
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives.join(",")));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_target(false).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}

fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

/// Local corpus plus seed-topic sentences. A missing corpus file is only
/// tolerated when seed topics can fill the index.
async fn build_index(
    config: &SabiaConfig,
    normalizer: Arc<dyn Normalizer>,
    lookup: &dyn Lookup,
) -> Result<KnowledgeIndex> {
    let path = expand_path(&config.knowledge_path);
    let mut entries = match load_entries(&path) {
        Ok(entries) => entries,
        Err(e) if !config.retrieval.seed_topics.is_empty() => {
            tracing::warn!("⚠️  {} unavailable ({}), using seed topics only", path.display(), e);
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };
    let seeded = seed_corpus(lookup, normalizer.as_ref(), &config.retrieval.seed_topics, entries.len()).await;
    entries.extend(seeded);
    Ok(KnowledgeIndex::build(entries, normalizer)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config_path = cli.config.as_deref().map(expand_path);
    let mut config = SabiaConfig::load(config_path.as_deref())?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers.max(1);
    }
    if let Some(url) = cli.set_webhook.clone() {
        config.gateway.webhook_url = Some(url);
    }

    // NLP + knowledge
    let normalizer: Arc<dyn Normalizer> = Arc::new(TextNormalizer::new(&config.nlp)?);
    let lookup_timeout = Duration::from_secs(config.retrieval.lookup_timeout_secs);
    let wikipedia: Arc<dyn Lookup> = Arc::new(WikipediaLookup::new(&config.lookup, lookup_timeout)?);
    let index = Arc::new(build_index(&config, normalizer.clone(), wikipedia.as_ref()).await?);
    tracing::info!("📚 Knowledge index ready: {} entries", index.len());

    let mut retrieval = RetrievalEngine::new(index, &config);
    if config.retrieval.external_lookup {
        retrieval = retrieval.with_lookup(wikipedia.clone());
    }
    let responder = Arc::new(Responder::new(Arc::new(retrieval), ResponseAdapter::from_config(&config)));

    // Word cloud
    let render_timeout = Duration::from_secs(config.wordcloud.timeout_secs);
    let wordcloud = Arc::new(WordCloudService::new(
        &config.wordcloud,
        normalizer.clone(),
        wikipedia.clone(),
        Arc::new(WebContentExtractor::new(&config.lookup.user_agent, render_timeout)?),
        Arc::new(QuickChartRenderer::new(&config.wordcloud)?),
    ));

    // Transport
    let telegram = Arc::new(TelegramTransport::new(config.telegram_token.clone(), &config.telegram)?);
    match telegram.get_me().await {
        Ok(me) => tracing::info!("🤖 Connected as @{}", me.username.as_deref().unwrap_or(&me.first_name)),
        Err(e) => tracing::warn!("⚠️  getMe failed: {e}"),
    }

    let transport: Arc<dyn Transport> = telegram.clone();
    let mut handler = ChatHandler::new(transport, responder, wordcloud, &config.greetings);
    if config.voice.enabled {
        let chain = sabia_providers::create_speech_chain(&config)?;
        tracing::info!("🔊 Voice replies via {}", chain.producer_names().join(" → "));
        handler = handler.with_voice(Arc::new(chain));
    }

    // Queue + workers
    let queue = MessageQueue::new(config.queue_capacity);
    let pool = WorkerPool::start(config.workers, queue.clone(), Arc::new(handler));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Ingestion
    if cli.poll {
        if let Err(e) = telegram.delete_webhook().await {
            tracing::warn!("⚠️  deleteWebhook failed: {e}");
        }
        let mut updates = telegram.clone().start_polling();
        let queue = queue.clone();
        let mut stop = shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    next = updates.next() => {
                        let Some(inbound) = next else { break };
                        if let Err(e) = queue.enqueue_wait(inbound.chat_id, &inbound.text).await {
                            tracing::warn!("chat_id={} not queued: {}", inbound.chat_id, e);
                            break;
                        }
                    }
                }
            }
        });
    } else if let Some(url) = &config.gateway.webhook_url {
        if let Err(e) = telegram.set_webhook(url, config.gateway.webhook_secret.as_deref()).await {
            tracing::warn!("⚠️  setWebhook failed: {e}");
        }
    }

    println!("🐦 Sabia v{}", env!("CARGO_PKG_VERSION"));
    println!("   📡 Mode:    {}", if cli.poll { "long polling" } else { "webhook" });
    println!("   🌐 HTTP:    http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   👷 Workers: {}", pool.size());
    println!("   📚 Corpus:  {}", Path::new(&config.knowledge_path).display());
    println!();

    let state = Arc::new(AppState::new(queue.clone(), config.gateway.webhook_secret.clone()));
    let gateway_config = config.gateway.clone();
    let mut stop = shutdown_rx.clone();
    let mut server = tokio::spawn(async move {
        sabia_gateway::start(&gateway_config, state, async move {
            let _ = stop.changed().await;
        })
        .await
    });

    // The server only ends on its own if it failed to bind or serve.
    let ended_early = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
        result = &mut server => Some(result),
    };
    if let Some(result) = ended_early {
        pool.shutdown().await;
        return match result {
            Ok(outcome) => outcome,
            Err(e) => Err(e.into()),
        };
    }

    tracing::info!("🛑 Shutting down...");
    let _ = shutdown_tx.send(true);
    match server.await {
        Ok(Err(e)) => tracing::error!("Gateway error: {e}"),
        Err(e) => tracing::error!("Gateway task failed: {e}"),
        Ok(Ok(())) => {}
    }
    pool.shutdown().await;
    let stats = queue.stats();
    tracing::info!(
        "👋 Bye: {} completed, {} failed, {} rejected",
        stats.completed,
        stats.failed,
        stats.rejected
    );
    Ok(())
}
