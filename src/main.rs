use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use forex_analysis_client::billing::{BillingState, BillingUpdate};
use forex_analysis_client::client::{AnalysisClient, HttpTransport, ReplayTransport, Transport};
use forex_analysis_client::config::Config;
use forex_analysis_client::error::AnalysisError;
use forex_analysis_client::models::{AnalysisRequest, MultiAnalysisRequest, Provider};
use forex_analysis_client::render::MultiResultView;
use forex_analysis_client::session::AnalysisSession;

const USAGE: &str = "usage:
  forex-analysis-client multi <pair> <timeframe> <strategy> <provider,...> [provider=model,...]
  forex-analysis-client single <pair> <timeframe> <strategy>
  forex-analysis-client models
  forex-analysis-client billing";

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let transport = build_transport(&cfg)?;
    let session = Arc::new(AnalysisSession::new(
        AnalysisClient::new(&cfg, transport),
        BillingState::new(),
    ));

    {
        let session = session.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling in-flight requests");
                session.cancel_all();
            }
        });
    }

    let mut billing_rx = session.billing().subscribe();
    tokio::spawn(async move {
        while let Ok(update) = billing_rx.recv().await {
            match update {
                BillingUpdate::Charged(snap) => info!(
                    "Credits charged={:?} remaining={:?}",
                    snap.charged_credits, snap.monthly_credits_remaining
                ),
                BillingUpdate::Refreshed(summary) => info!(
                    "Credits remaining {}/{}",
                    summary.monthly_credits_remaining, summary.monthly_credits_max
                ),
            }
        }
    });

    let outcome = match command.as_str() {
        "multi" => run_multi(&session, &cfg, &args[1..]).await,
        "single" => run_single(&session, &cfg, &args[1..]).await,
        "models" => run_models(&session).await,
        "billing" => run_billing(&session).await,
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    };

    // Lead with the actionable message; the classified cause follows.
    outcome.map_err(|e| {
        let message = e.downcast_ref::<AnalysisError>().map(|analysis_err| {
            error!("{}", analysis_err);
            analysis_err.user_message()
        });
        match message {
            Some(message) => e.context(message),
            None => e,
        }
    })
}

/// HTTP by default; a recorded response body when ANALYSIS_REPLAY_FILE is set.
fn build_transport(cfg: &Config) -> Result<Box<dyn Transport>> {
    match std::env::var("ANALYSIS_REPLAY_FILE") {
        Ok(path) => {
            let body = std::fs::read_to_string(&path)
                .with_context(|| format!("reading replay file {}", path))?;
            info!("Replaying responses from {}", path);
            Ok(Box::new(ReplayTransport::new().respond(200, &body)))
        }
        Err(_) => Ok(Box::new(HttpTransport::new(cfg))),
    }
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    match args.get(idx) {
        Some(v) => Ok(v.as_str()),
        None => bail!("missing <{}>\n{}", name, USAGE),
    }
}

fn parse_providers(list: &str) -> Result<Vec<Provider>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Provider>().map_err(anyhow::Error::msg))
        .collect()
}

async fn run_multi(session: &AnalysisSession, cfg: &Config, args: &[String]) -> Result<()> {
    let pair = arg(args, 0, "pair")?;
    let timeframe = arg(args, 1, "timeframe")?;
    let strategy = arg(args, 2, "strategy")?;
    let providers = parse_providers(arg(args, 3, "providers")?)?;

    let mut request = MultiAnalysisRequest::new(pair, timeframe, strategy, &providers)
        .with_count(cfg.candle_count);

    if let Some(models) = args.get(4) {
        for entry in models.split(',').filter(|s| !s.trim().is_empty()) {
            let Some((provider, model)) = entry.split_once('=') else {
                bail!("model override '{}' is not provider=model", entry);
            };
            let provider: Provider = provider.trim().parse().map_err(anyhow::Error::msg)?;
            request = request.with_model(provider, model);
        }
    }

    let response = session.submit_multi(&request).await?;
    println!("{}", MultiResultView::from_response(&response));
    Ok(())
}

async fn run_single(session: &AnalysisSession, cfg: &Config, args: &[String]) -> Result<()> {
    let request = AnalysisRequest::new(
        arg(args, 0, "pair")?,
        arg(args, 1, "timeframe")?,
        arg(args, 2, "strategy")?,
    )
    .with_count(cfg.candle_count);

    let response = session.submit_single(&request).await?;
    let rec = &response.analysis;

    println!("{} • {}", response.pair, response.granularity);
    println!("  Signal       {}", rec.signal.as_str());
    println!("  Confidence   {}", rec.confidence);
    println!("  Entry        {}", rec.entry);
    println!("  Stop loss    {}", rec.stop_loss);
    println!("  Take profit  {}", rec.take_profit);
    println!("  R:R          {}", rec.risk_reward_ratio);
    println!("  {}", rec.recommendation);
    Ok(())
}

async fn run_models(session: &AnalysisSession) -> Result<()> {
    let cancel = session.cancellation_token();
    let catalog = session.client().fetch_models_catalog(&cancel).await?;
    for (provider, models) in &catalog {
        println!("{:<10} {}", provider, models.join(", "));
    }
    Ok(())
}

async fn run_billing(session: &AnalysisSession) -> Result<()> {
    let cancel = session.cancellation_token();
    let summary = session
        .billing()
        .refresh(session.client(), &cancel)
        .await?;

    println!("Plan       {}", summary.plan);
    println!(
        "Credits    {} / {}",
        summary.monthly_credits_remaining, summary.monthly_credits_max
    );
    if let Some(cap) = summary.daily_cap {
        println!(
            "Today      {} / {}",
            summary.daily_credits_spent.unwrap_or(0.0),
            cap
        );
    }
    Ok(())
}
