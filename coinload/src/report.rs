//! Check accumulation and the end-of-run report.
//!
//! Every request a virtual user issues emits one named check. The aggregator
//! is the only state shared across the population, so accumulation has to be
//! safe under concurrent emission from every user: pass/fail counts are
//! relaxed atomics and latencies go into lock-free buckets, drained into a
//! t-digest once at run end.

use metrics_util::AtomicBucket;
use pdatastructs::tdigest::{TDigest, K1};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Named assertions the scenario records, one per request kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Check {
    Auth,
    Info,
    SendCoin,
    BuyItem,
}

impl Check {
    pub const ALL: [Check; 4] = [Check::Auth, Check::Info, Check::SendCoin, Check::BuyItem];

    pub fn name(self) -> &'static str {
        match self {
            Check::Auth => "auth status is 200",
            Check::Info => "info status is 200",
            Check::SendCoin => "sendCoin status is 200",
            Check::BuyItem => "buy item status is 200",
        }
    }

    fn index(self) -> usize {
        match self {
            Check::Auth => 0,
            Check::Info => 1,
            Check::SendCoin => 2,
            Check::BuyItem => 3,
        }
    }
}

struct CheckAtomics {
    passed: AtomicU64,
    failed: AtomicU64,
    latency: AtomicBucket<Duration>,
}

impl CheckAtomics {
    fn new() -> Self {
        Self {
            passed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            latency: AtomicBucket::new(),
        }
    }
}

/// Many-producer accumulator shared (behind an `Arc`) by all virtual users.
pub(crate) struct Aggregator {
    checks: [CheckAtomics; 4],
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            checks: std::array::from_fn(|_| CheckAtomics::new()),
        }
    }

    /// Record one check outcome. Safe from any number of tasks.
    pub fn record(&self, check: Check, passed: bool, latency: Duration) {
        let slot = &self.checks[check.index()];
        if passed {
            slot.passed.fetch_add(1, Ordering::Relaxed);
        } else {
            slot.failed.fetch_add(1, Ordering::Relaxed);
        }
        slot.latency.push(latency);

        #[cfg(feature = "metrics")]
        {
            if passed {
                metrics::counter!("coinload_check_passed", "check" => check.name()).increment(1);
            } else {
                metrics::counter!("coinload_check_failed", "check" => check.name()).increment(1);
            }
            metrics::histogram!("coinload_request_latency", "check" => check.name())
                .record(latency.as_secs_f64());
        }
    }

    /// Drain the counters into an immutable report.
    pub fn collect(&self, elapsed: Duration) -> RunReport {
        let checks = Check::ALL.map(|check| {
            let slot = &self.checks[check.index()];
            let mut digest = default_tdigest();
            let mut count = 0usize;
            slot.latency.clear_with(|durations| {
                for duration in durations {
                    digest.insert(duration.as_secs_f64());
                    count += 1;
                }
            });
            let quantile = |q: f64| {
                if count == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_secs_f64(digest.quantile(q))
                }
            };
            CheckSummary {
                check,
                passed: slot.passed.load(Ordering::Relaxed),
                failed: slot.failed.load(Ordering::Relaxed),
                latency_p50: quantile(0.5),
                latency_p90: quantile(0.9),
                latency_p99: quantile(0.99),
            }
        });
        RunReport { elapsed, checks }
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

/// Aggregate pass/fail counts and latency quantiles for one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub elapsed: Duration,
    pub checks: [CheckSummary; 4],
}

#[derive(Debug, Clone)]
pub struct CheckSummary {
    pub check: Check,
    pub passed: u64,
    pub failed: u64,
    pub latency_p50: Duration,
    pub latency_p90: Duration,
    pub latency_p99: Duration,
}

impl CheckSummary {
    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }
}

impl RunReport {
    pub fn check(&self, check: Check) -> &CheckSummary {
        &self.checks[check.index()]
    }

    pub fn total_requests(&self) -> u64 {
        self.checks.iter().map(CheckSummary::total).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.checks.iter().map(|summary| summary.failed).sum()
    }

    pub fn error_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.
        } else {
            self.total_failed() as f64 / total as f64
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = Duration::from_millis(self.elapsed.as_millis() as u64);
        writeln!(f, "run complete in {}", humantime::format_duration(rounded))?;
        for summary in &self.checks {
            writeln!(
                f,
                "  {:<24} passed {:>8} failed {:>8}  p50 {:>10.2?} p90 {:>10.2?} p99 {:>10.2?}",
                summary.check.name(),
                summary.passed,
                summary.failed,
                summary.latency_p50,
                summary.latency_p90,
                summary.latency_p99,
            )?;
        }
        write!(
            f,
            "  {} requests total, {:.2}% failed",
            self.total_requests(),
            self.error_rate() * 100.
        )
    }
}
