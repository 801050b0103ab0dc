mod adapter;
mod api;
mod chain;
mod config;
mod contracts;
mod error;
mod finalizer;
mod metrics;
mod types;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use eyre::WrapErr;

use adapter::{ArbitrumGatewayAdapter, BridgeAdapter, GatewaySettings};
use chain::{
    EvmLogClient, NitroMessageClient, StaticTokenRegistry, TransactionSubmitter, WalletSubmitter,
};
use config::Config;
use finalizer::{BatchAssembler, FinalizationPlanner, MessageStatusResolver, WithdrawalScanner};

fn main() -> eyre::Result<()> {
    // Install color-eyre for better error reporting
    color_eyre::install()?;

    // Run the async main
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> eyre::Result<()> {
    init_logging();

    tracing::info!("Starting gateway relayer");

    let config = Config::load()?;
    tracing::info!(
        l1_chain_id = config.l1.chain_id,
        l2_chain_id = config.l2.chain_id,
        addresses = config.bridge.monitored_addresses.len(),
        tokens = config.bridge.tokens.len(),
        "Configuration loaded"
    );

    let settings = GatewaySettings::from_config(&config.bridge)?;
    let monitored = parse_addresses(&config.bridge.monitored_addresses)?;
    let l1_tokens = config
        .bridge
        .tokens
        .iter()
        .map(|entry| {
            Address::from_str(&entry.l1_token)
                .wrap_err_with(|| format!("Invalid l1_token for {}", entry.symbol))
        })
        .collect::<eyre::Result<Vec<Address>>>()?;

    let outbox =
        Address::from_str(&config.bridge.outbox).wrap_err("Invalid outbox address")?;
    let rollup =
        Address::from_str(&config.bridge.rollup).wrap_err("Invalid rollup address")?;

    let l1_logs = Arc::new(EvmLogClient::new(
        &config.l1.rpc_url,
        config.relayer.log_page_size,
    )?);
    let l2_logs = Arc::new(EvmLogClient::new(
        &config.l2.rpc_url,
        config.relayer.log_page_size,
    )?);
    let submitter: Arc<dyn TransactionSubmitter> = Arc::new(WalletSubmitter::new(
        &config.l1.rpc_url,
        &config.submitter.private_key,
    ));
    let message_service = Arc::new(NitroMessageClient::new(
        &config.l1.rpc_url,
        &config.l2.rpc_url,
        outbox,
        rollup,
    )?);
    let registry = Arc::new(StaticTokenRegistry::from_entries(&config.bridge.tokens)?);

    let mut bridge_adapter = ArbitrumGatewayAdapter::new(
        l1_logs.clone(),
        l2_logs.clone(),
        submitter.clone(),
        settings.clone(),
        monitored,
        config.relayer.l1_lookback_blocks,
        config.relayer.l2_lookback_blocks,
    );
    let scanner = WithdrawalScanner::new(
        l2_logs.clone(),
        settings,
        config.relayer.l2_lookback_blocks,
    );
    let resolver = MessageStatusResolver::new(message_service.clone());
    let planner = FinalizationPlanner::new(message_service, outbox);
    let assembler = BatchAssembler::new(registry, config.l2.chain_id);

    tracing::info!("Components initialized, starting processing");

    // Start metrics/API server
    let api_addr = SocketAddr::from(([0, 0, 0, 0], config.relayer.api_port));
    tokio::spawn(async move {
        if let Err(e) = api::start_api_server(api_addr).await {
            tracing::error!(error = %e, "API server error");
        }
    });

    // Setup signal handlers
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(()).await;
    });

    let poll_interval = Duration::from_millis(config.relayer.poll_interval_ms);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {
                run_reconcile_pass(&mut bridge_adapter, &l1_tokens).await;
                run_finalization_pass(&scanner, &resolver, &planner, &assembler, submitter.as_ref()).await;
            }
        }
    }

    tracing::info!("Gateway relayer stopped");
    Ok(())
}

/// One reconciliation pass. A failure aborts the whole pass; the view
/// is recomputed from scratch on the next poll.
async fn run_reconcile_pass(bridge_adapter: &mut ArbitrumGatewayAdapter, l1_tokens: &[Address]) {
    match bridge_adapter.outstanding_transfers(l1_tokens).await {
        Ok(view) => {
            metrics::RECONCILE_PASSES.inc();
            metrics::LAST_SUCCESSFUL_POLL
                .with_label_values(&["reconcile"])
                .set(unix_now());
            for (address, per_token) in &view {
                for (token, amount) in per_token {
                    metrics::OUTSTANDING_AMOUNT
                        .with_label_values(&[&address.to_string(), &token.to_string()])
                        .set(lossy_f64(*amount));
                    if !amount.is_zero() {
                        tracing::debug!(
                            address = %address,
                            token = %token,
                            amount = %amount,
                            "Outstanding cross-chain transfer"
                        );
                    }
                }
            }
        }
        Err(e) => {
            metrics::RECONCILE_FAILURES.inc();
            tracing::error!(error = %e, "Reconciliation pass aborted; retrying on next poll");
        }
    }
}

/// One finalization pass: scan, resolve, plan, assemble, submit.
/// Per-message failures are reported and retried on the next pass
/// without blocking the rest of the batch.
async fn run_finalization_pass(
    scanner: &WithdrawalScanner,
    resolver: &MessageStatusResolver,
    planner: &FinalizationPlanner,
    assembler: &BatchAssembler,
    submitter: &dyn TransactionSubmitter,
) {
    let events = match scanner.scan().await {
        Ok(events) => events,
        Err(e) => {
            tracing::error!(error = %e, "Withdrawal scan failed");
            return;
        }
    };
    if events.is_empty() {
        return;
    }
    tracing::debug!(count = events.len(), "Resolving withdrawal initiations");

    let resolved = resolver.resolve_all(&events).await;
    let ready = planner.select_ready(&resolved);
    if ready.is_empty() {
        return;
    }

    let mut planned = Vec::new();
    for item in ready {
        let Some(message) = item.message.as_ref() else {
            continue;
        };
        match planner.build_execution_call(message).await {
            Ok(call) => planned.push((item.event.clone(), call)),
            Err(e) => {
                metrics::PROOF_FAILURES.inc();
                tracing::error!(
                    error = %e,
                    tx_hash = %item.event.tx_hash,
                    "Confirmed withdrawal could not be planned"
                );
            }
        }
    }
    if planned.is_empty() {
        return;
    }

    let batch = match assembler.assemble(&planned) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!(error = %e, "Batch assembly failed");
            return;
        }
    };
    for summary in &batch.summaries {
        tracing::info!(
            l2_chain_id = summary.l2_chain_id,
            token = %summary.l1_token_symbol,
            amount = %summary.amount,
            "Finalizing withdrawal"
        );
    }

    for call in &batch.calls {
        match submitter.submit(call, U256::ZERO).await {
            Ok(tx_hash) => {
                metrics::FINALIZATIONS_SUBMITTED
                    .with_label_values(&["success"])
                    .inc();
                tracing::info!(tx_hash = %tx_hash, "Withdrawal execution submitted");
            }
            Err(e) => {
                metrics::FINALIZATIONS_SUBMITTED
                    .with_label_values(&["failed"])
                    .inc();
                tracing::error!(error = %e, "Withdrawal execution submission failed");
            }
        }
    }

    metrics::LAST_SUCCESSFUL_POLL
        .with_label_values(&["finalize"])
        .set(unix_now());
}

fn parse_addresses(raw: &[String]) -> eyre::Result<Vec<Address>> {
    raw.iter()
        .map(|s| Address::from_str(s).wrap_err_with(|| format!("Invalid monitored address {}", s)))
        .collect()
}

/// Lossy conversion for gauge export; fine for monitoring, never used
/// in reconciliation arithmetic.
fn lossy_f64(amount: U256) -> f64 {
    amount.to_string().parse().unwrap_or(f64::INFINITY)
}

fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as f64)
        .unwrap_or(0.0)
}

/// Initialize tracing/logging with structured output
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gateway_relayer=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(filter)
        .init();
}

/// Wait for shutdown signals (SIGINT/SIGTERM)
async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
