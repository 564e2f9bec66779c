//! Prometheus metrics for the auth service.
//!
//! - `bookbot_registrations_total{outcome}` - Registration attempts by outcome
//! - `bookbot_logins_total{outcome}` - Login attempts by outcome
//! - `bookbot_session_checks_total{outcome}` - Token validations by outcome
//! - `bookbot_dialogue_events_total{event}` - Dialogue events handled
//! - `bookbot_active_dialogues` - Dialogues currently in flight
//! - `bookbot_sessions_purged_total` - Expired session rows reclaimed

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

pub static REGISTRATIONS: OnceLock<IntCounterVec> = OnceLock::new();

pub static LOGINS: OnceLock<IntCounterVec> = OnceLock::new();

pub static SESSION_CHECKS: OnceLock<IntCounterVec> = OnceLock::new();

pub static DIALOGUE_EVENTS: OnceLock<IntCounterVec> = OnceLock::new();

pub static ACTIVE_DIALOGUES: OnceLock<IntGauge> = OnceLock::new();

pub static SESSIONS_PURGED: OnceLock<IntCounter> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Recording before `init` is a no-op, so library users and tests that never
/// call it pay nothing.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(REGISTRATIONS, IntCounterVec::new(Opts::new("bookbot_registrations_total", "Registration attempts by outcome"), &["outcome"]));
    register!(LOGINS, IntCounterVec::new(Opts::new("bookbot_logins_total", "Login attempts by outcome"), &["outcome"]));
    register!(SESSION_CHECKS, IntCounterVec::new(Opts::new("bookbot_session_checks_total", "Session validations by outcome"), &["outcome"]));
    register!(DIALOGUE_EVENTS, IntCounterVec::new(Opts::new("bookbot_dialogue_events_total", "Dialogue events handled"), &["event"]));
    register!(ACTIVE_DIALOGUES, IntGauge::new("bookbot_active_dialogues", "Dialogues currently in flight"));
    register!(SESSIONS_PURGED, IntCounter::new("bookbot_sessions_purged_total", "Expired session rows reclaimed"));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

#[inline]
fn inc_labeled(metric: &OnceLock<IntCounterVec>, label: &str) {
    if let Some(c) = metric.get() {
        c.with_label_values(&[label]).inc();
    }
}

#[inline]
pub fn record_registration(outcome: &str) {
    inc_labeled(&REGISTRATIONS, outcome);
}

#[inline]
pub fn record_login(outcome: &str) {
    inc_labeled(&LOGINS, outcome);
}

#[inline]
pub fn record_session_check(outcome: &str) {
    inc_labeled(&SESSION_CHECKS, outcome);
}

#[inline]
pub fn record_dialogue_event(event: &str) {
    inc_labeled(&DIALOGUE_EVENTS, event);
}

#[inline]
pub fn set_active_dialogues(count: usize) {
    if let Some(g) = ACTIVE_DIALOGUES.get() {
        g.set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}

#[inline]
pub fn record_sessions_purged(count: u64) {
    if let Some(c) = SESSIONS_PURGED.get() {
        c.inc_by(count);
    }
}
