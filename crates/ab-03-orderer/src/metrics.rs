//! # Orderer Metrics
//!
//! Prometheus counters, enabled with the `metrics` feature:
//!
//! - `abft_events_processed_total`
//! - `abft_events_dropped_total`
//! - `abft_roots_total`
//! - `abft_atropos_decided_total`
//! - `abft_last_decided_frame`
//! - `abft_epochs_sealed_total`
//! - `abft_current_epoch`
//!
//! Without the feature every function is a no-op.

use shared_types::{Epoch, Frame};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref EVENTS_PROCESSED: IntCounter = register_int_counter!(
        "abft_events_processed_total",
        "Events that passed frame assignment"
    )
    .expect("Failed to create EVENTS_PROCESSED metric");

    pub static ref EVENTS_DROPPED: IntCounter = register_int_counter!(
        "abft_events_dropped_total",
        "Events rejected with a recoverable error"
    )
    .expect("Failed to create EVENTS_DROPPED metric");

    pub static ref ROOTS: IntCounter = register_int_counter!(
        "abft_roots_total",
        "Root registrations, one per frame a root covers"
    )
    .expect("Failed to create ROOTS metric");

    pub static ref ATROPOS_DECIDED: IntCounter = register_int_counter!(
        "abft_atropos_decided_total",
        "Delivered Atropos decisions"
    )
    .expect("Failed to create ATROPOS_DECIDED metric");

    pub static ref LAST_DECIDED_FRAME: IntGauge = register_int_gauge!(
        "abft_last_decided_frame",
        "Frame of the last delivered Atropos"
    )
    .expect("Failed to create LAST_DECIDED_FRAME metric");

    pub static ref EPOCHS_SEALED: IntCounter = register_int_counter!(
        "abft_epochs_sealed_total",
        "Sealed epochs"
    )
    .expect("Failed to create EPOCHS_SEALED metric");

    pub static ref CURRENT_EPOCH: IntGauge = register_int_gauge!(
        "abft_current_epoch",
        "Current epoch"
    )
    .expect("Failed to create CURRENT_EPOCH metric");
}

#[cfg(feature = "metrics")]
pub fn record_event_processed() {
    EVENTS_PROCESSED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_event_dropped() {
    EVENTS_DROPPED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_root() {
    ROOTS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_atropos(frame: Frame) {
    ATROPOS_DECIDED.inc();
    LAST_DECIDED_FRAME.set(i64::from(frame));
}

#[cfg(feature = "metrics")]
pub fn record_epoch_sealed(new_epoch: Epoch) {
    EPOCHS_SEALED.inc();
    CURRENT_EPOCH.set(i64::from(new_epoch));
}

#[cfg(not(feature = "metrics"))]
pub fn record_event_processed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_dropped() {}

#[cfg(not(feature = "metrics"))]
pub fn record_root() {}

#[cfg(not(feature = "metrics"))]
pub fn record_atropos(_frame: Frame) {}

#[cfg(not(feature = "metrics"))]
pub fn record_epoch_sealed(_new_epoch: Epoch) {}
