use clap::Parser;
use hitl_extension_escalation::EscalationPolicy;
use hitl_server::http;
use hitl_server::service::AppState;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hitl-server")]
struct Args {
    #[arg(long, env = "HITL_HTTP_ADDR", default_value = "127.0.0.1:8001")]
    http_addr: String,

    /// Sliding expiry of session records.
    #[arg(long, env = "HITL_SESSION_TTL_SECS", default_value_t = 3600)]
    session_ttl_secs: u64,

    /// How often expired session records are purged.
    #[arg(long, env = "HITL_PURGE_INTERVAL_SECS", default_value_t = 60)]
    purge_interval_secs: u64,

    /// JSON file with `{auto_max, review_max, review, supervisor}`.
    #[arg(long, env = "HITL_ESCALATION_CONFIG")]
    escalation_config: Option<PathBuf>,

    /// Default system instruction for new runs.
    #[arg(long, env = "HITL_SYSTEM_PROMPT")]
    system_prompt: Option<String>,
}

fn load_policy(path: Option<&PathBuf>) -> EscalationPolicy {
    let Some(path) = path else {
        return EscalationPolicy::default();
    };
    match EscalationPolicy::load(path) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let policy = load_policy(args.escalation_config.as_ref());
    tracing::info!(
        auto_max = policy.auto_max,
        review_max = policy.review_max,
        "escalation policy loaded"
    );

    let os = match hitl_server::build_refund_os(
        policy,
        Duration::from_secs(args.session_ttl_secs),
        args.system_prompt,
    ) {
        Ok(os) => os,
        Err(e) => {
            eprintln!("failed to build SessionOs: {e}");
            std::process::exit(2);
        }
    };
    let state = AppState::new(os);

    if args.purge_interval_secs > 0 {
        let os = state.os.clone();
        let period = Duration::from_secs(args.purge_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match os.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "expired sessions purged"),
                    Err(e) => tracing::warn!(error = %e, "session purge failed"),
                }
            }
        });
    }

    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&args.http_addr)
        .await
        .expect("failed to bind http listener");
    tracing::info!(addr = %args.http_addr, "hitl-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .expect("http server crashed");
}
