mod api;
mod gateway;

use api::{ApiState, Transports};
use chatlingo_channels::{
    sms::SmsAdapter, telegram::TelegramAdapter, web::WebAdapter, whatsapp::WhatsAppAdapter,
};
use chatlingo_core::{
    config::{self, Config, Prompts},
    curriculum::Curriculum,
    scenarios,
    traits::{PlatformAdapter, Provider},
};
use chatlingo_memory::Store;
use chatlingo_providers::{build_provider, LlmGateway};
use clap::{Parser, Subcommand};
use gateway::Gateway;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "chatlingo",
    version,
    about = "Chatlingo: Kannada practice over WhatsApp, Telegram and SMS"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml", env = "CHATLINGO_CONFIG")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve webhooks and run the daily nudge timer.
    Start,
    /// Run one nudge sweep now and exit.
    Nudge,
    /// Seed and list roleplay scenarios.
    Scenarios,
    /// Show configuration, provider selection and store counts.
    Status,
}

/// Stdout plus a daily-rolling file under `{data_dir}/logs`.
///
/// The returned guard must live as long as the process, or buffered file
/// output is lost.
fn init_tracing(cfg: &Config) -> Option<WorkerGuard> {
    let level = if cfg.chatlingo.debug {
        "debug"
    } else {
        cfg.chatlingo.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stdout = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    let log_dir = cfg.log_dir();
    match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&log_dir, "chatlingo.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .init();
            warn!("logging: cannot create {log_dir} ({e}), stdout only");
            None
        }
    }
}

/// Build the transports that are enabled and fully configured.
fn build_transports(cfg: &Config) -> anyhow::Result<Transports> {
    let mut transports = Transports {
        web: Arc::new(WebAdapter::new()),
        ..Default::default()
    };

    if let Some(ref wa) = cfg.channel.whatsapp {
        if wa.enabled {
            if wa.access_token.is_empty() || wa.phone_number_id.is_empty() {
                anyhow::bail!(
                    "WhatsApp is enabled but access_token or phone_number_id is empty. \
                     Set them in config.toml or WHATSAPP_ACCESS_TOKEN / WHATSAPP_PHONE_ID."
                );
            }
            if wa.verify_token.is_empty() {
                warn!("whatsapp: verify_token is empty, webhook verification will always fail");
            }
            transports.whatsapp = Some(Arc::new(WhatsAppAdapter::new(wa.clone())));
        }
    }

    if let Some(ref tg) = cfg.channel.telegram {
        if tg.enabled {
            if tg.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram is enabled but bot_token is empty. \
                     Set it in config.toml or TELEGRAM_BOT_TOKEN env var."
                );
            }
            transports.telegram = Some(Arc::new(TelegramAdapter::new(tg.clone())));
        }
    }

    if let Some(ref sms) = cfg.channel.sms {
        if sms.enabled {
            if sms.account_sid.is_empty() || sms.auth_token.is_empty() || sms.from_number.is_empty()
            {
                anyhow::bail!(
                    "SMS is enabled but account_sid, auth_token or from_number is empty. \
                     Set them in config.toml or the TWILIO_* env vars."
                );
            }
            transports.sms = Some(Arc::new(SmsAdapter::new(sms.clone())));
        }
    }

    Ok(transports)
}

/// Open the store and write the scenario catalogue into it.
async fn open_store(cfg: &Config) -> anyhow::Result<Store> {
    let store = Store::new(&cfg.memory).await?;
    let seed = scenarios::load_seed(cfg.scenarios.path.as_deref())?;
    let seeded = store.upsert_scenarios(&seed).await?;
    info!("scenarios: {seeded} seeded");
    Ok(store)
}

/// Wire store, provider, curriculum, prompts and transports into a gateway.
async fn build_gateway(cfg: &Config) -> anyhow::Result<(Arc<Gateway>, Transports)> {
    let prompts = Prompts::load(&cfg.chatlingo.data_dir);
    let llm = LlmGateway::new(build_provider(&cfg.provider)?, &prompts);
    let curriculum = Curriculum::load(cfg.curriculum.path.as_deref());
    let store = open_store(cfg).await?;
    let transports = build_transports(cfg)?;

    let mut adapters: Vec<Arc<dyn PlatformAdapter>> = vec![transports.web.clone()];
    if let Some(ref wa) = transports.whatsapp {
        adapters.push(wa.clone());
    }
    if let Some(ref tg) = transports.telegram {
        adapters.push(tg.clone());
    }
    if let Some(ref sms) = transports.sms {
        adapters.push(sms.clone());
    }

    let gateway = Gateway::new(cfg, store, llm, curriculum, prompts, adapters);
    Ok((Arc::new(gateway), transports))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_tracing(&cfg);

    match cli.command {
        Commands::Start => {
            let (gw, transports) = build_gateway(&cfg).await?;
            if transports.whatsapp.is_none()
                && transports.telegram.is_none()
                && transports.sms.is_none()
            {
                warn!("no messaging transport enabled; only the web chat is reachable");
            }

            if cfg.nudge.enabled {
                let at = gateway::parse_nudge_time(&cfg.nudge.time)?;
                tokio::spawn(gw.clone().nudge_loop(at, cfg.nudge.max_concurrency));
            } else {
                info!("nudge: daily timer disabled");
            }

            info!("store: {} users known", gw.store().user_count().await?);
            println!("Chatlingo: starting ({})", cfg.chatlingo.environment);
            let state = ApiState::new(gw, transports, &cfg);
            api::serve(&cfg.api, state).await?;
        }
        Commands::Nudge => {
            let (gw, _) = build_gateway(&cfg).await?;
            let report = gw.run_nudge_sweep(cfg.nudge.max_concurrency).await?;
            println!(
                "Nudges: {} users | {} sent | {} failed | {} skipped",
                report.users, report.sent, report.failed, report.skipped
            );
        }
        Commands::Scenarios => {
            let store = open_store(&cfg).await?;
            let all = store.all_scenarios().await?;
            if all.is_empty() {
                println!("No scenarios.");
            }
            for s in all {
                println!("  {:>3}  {}", s.id, s.title);
            }
        }
        Commands::Status => {
            println!("Chatlingo: Status Check\n");
            println!("Config: {}", cli.config);
            println!("Environment: {}", cfg.chatlingo.environment);
            println!("Data dir: {}", config::shellexpand(&cfg.chatlingo.data_dir));
            println!();

            match build_provider(&cfg.provider) {
                Ok(p) => println!(
                    "  provider: {} ({})",
                    p.name(),
                    if p.has_credentials() {
                        "credentials present"
                    } else {
                        "missing api key"
                    }
                ),
                Err(e) => println!("  provider: error ({e})"),
            }

            let wa = cfg.channel.whatsapp.as_ref();
            println!(
                "  whatsapp: {}",
                transport_status(
                    wa.map(|c| c.enabled),
                    wa.is_some_and(|c| !c.access_token.is_empty() && !c.phone_number_id.is_empty())
                )
            );
            let tg = cfg.channel.telegram.as_ref();
            println!(
                "  telegram: {}",
                transport_status(tg.map(|c| c.enabled), tg.is_some_and(|c| !c.bot_token.is_empty()))
            );
            let sms = cfg.channel.sms.as_ref();
            println!(
                "  sms: {}",
                transport_status(
                    sms.map(|c| c.enabled),
                    sms.is_some_and(|c| !c.account_sid.is_empty() && !c.auth_token.is_empty())
                )
            );
            println!(
                "  nudge: {}",
                if cfg.nudge.enabled {
                    format!("daily at {} UTC", cfg.nudge.time)
                } else {
                    "disabled".to_string()
                }
            );
            println!();

            let store = Store::new(&cfg.memory).await?;
            println!("  users: {}", store.user_count().await?);
            println!("  messages: {}", store.message_count().await?);
            println!("  scenarios: {}", store.all_scenarios().await?.len());
        }
    }

    Ok(())
}

fn transport_status(enabled: Option<bool>, has_credentials: bool) -> &'static str {
    match enabled {
        None => "not configured",
        Some(false) => "disabled",
        Some(true) if has_credentials => "configured",
        Some(true) => "enabled but missing credentials",
    }
}
