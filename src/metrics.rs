//! Prometheus metrics for the gateway relayer
//!
//! Exposes metrics on /metrics endpoint for Prometheus scraping.

#![allow(dead_code)]

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_int_counter, CounterVec,
    Gauge, GaugeVec, IntCounter,
};

lazy_static! {
    // Reconciliation metrics
    pub static ref RECONCILE_PASSES: IntCounter = register_int_counter!(
        "relayer_reconcile_passes_total",
        "Total number of completed reconciliation passes"
    ).unwrap();

    pub static ref RECONCILE_FAILURES: IntCounter = register_int_counter!(
        "relayer_reconcile_failures_total",
        "Total number of aborted reconciliation passes"
    ).unwrap();

    pub static ref OUTSTANDING_AMOUNT: GaugeVec = register_gauge_vec!(
        "relayer_outstanding_amount",
        "Outstanding in-flight transfer amount in base units (lossy f64, monitoring only)",
        &["address", "token"]
    ).unwrap();

    // Withdrawal resolution metrics
    pub static ref WITHDRAWALS_RESOLVED: CounterVec = register_counter_vec!(
        "relayer_withdrawals_resolved_total",
        "Total withdrawal messages resolved, by status",
        &["status"]
    ).unwrap();

    pub static ref WITHDRAWAL_STATUS: GaugeVec = register_gauge_vec!(
        "relayer_withdrawal_status",
        "Message count per lifecycle status in the latest resolution pass",
        &["status"]
    ).unwrap();

    pub static ref STRUCTURAL_ANOMALIES: IntCounter = register_int_counter!(
        "relayer_structural_anomalies_total",
        "Transactions missing an expected outbound message"
    ).unwrap();

    // Finalization metrics
    pub static ref FINALIZATIONS_PLANNED: IntCounter = register_int_counter!(
        "relayer_finalizations_planned_total",
        "Execution calls built for confirmed messages"
    ).unwrap();

    pub static ref PROOF_FAILURES: IntCounter = register_int_counter!(
        "relayer_proof_failures_total",
        "Confirmed messages whose outbox proof could not be fetched"
    ).unwrap();

    pub static ref FINALIZATIONS_SUBMITTED: CounterVec = register_counter_vec!(
        "relayer_finalizations_submitted_total",
        "Execution calls handed to the transaction submitter",
        &["status"]
    ).unwrap();

    // Health metrics
    pub static ref UP: Gauge = register_gauge!(
        "relayer_up",
        "Whether the relayer is up and running"
    ).unwrap();

    pub static ref LAST_SUCCESSFUL_POLL: GaugeVec = register_gauge_vec!(
        "relayer_last_successful_poll_timestamp",
        "Unix timestamp of last successful poll",
        &["loop"]
    ).unwrap();
}
