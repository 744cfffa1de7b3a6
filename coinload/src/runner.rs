//! Spawns the virtual-user population and bounds the run by wall-clock time.

use crate::client::{ApiClient, ShopApi};
use crate::config::RunConfig;
use crate::error::Error;
use crate::report::{Aggregator, RunReport};
use crate::scenario::VirtualUser;
use crate::session::Session;
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Handle for a configured run.
///
/// Builder-style: construct with the target base URL, chain
/// [`users`](Self::users)/[`duration`](Self::duration)/[`pacing`](Self::pacing),
/// then `.await` to execute and collect the [`RunReport`].
#[pin_project::pin_project]
pub struct LoadTest {
    config: RunConfig,
    runner_fut: Option<Pin<Box<dyn Future<Output = Result<RunReport, Error>> + Send>>>,
}

impl LoadTest {
    pub fn new(base_url: &str) -> Self {
        Self {
            config: RunConfig::new(base_url),
            runner_fut: None,
        }
    }

    /// Number of concurrent virtual users, all live from time zero.
    pub fn users(mut self, users: usize) -> Self {
        self.config.users = users;
        self
    }

    /// Wall-clock bound for the run.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    /// Idle interval between iterations of a single user.
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.config.pacing = pacing;
        self
    }
}

impl Future for LoadTest {
    type Output = Result<RunReport, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(async move { run_load_test(config).await }));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

#[instrument(name = "load_test", skip_all, fields(users = config.users, base_url = %config.base_url))]
pub(crate) async fn run_load_test(config: RunConfig) -> Result<RunReport, Error> {
    config.validate()?;
    let api = ApiClient::new(&config)?;
    run_with_api(api, config).await
}

pub(crate) async fn run_with_api<A>(api: A, config: RunConfig) -> Result<RunReport, Error>
where
    A: ShopApi + Clone + Send + Sync + 'static,
{
    info!("starting run: {config}");

    let aggregator = Arc::new(Aggregator::new());
    let stop = Arc::new(AtomicBool::new(false));
    let start = Instant::now();

    let mut users = Vec::with_capacity(config.users);
    for id in 0..config.users {
        let mut user = VirtualUser::new(
            id,
            config.users,
            Session::new(),
            api.clone(),
            Arc::clone(&aggregator),
            config.pacing,
        );
        let stop = Arc::clone(&stop);
        users.push(tokio::spawn(async move {
            while !stop.load(Ordering::Relaxed) {
                user.run_iteration().await;
            }
            user.into_session()
        }));
    }

    tokio::select! {
        _ = tokio::time::sleep(config.duration) => {}
        Ok(()) = tokio::signal::ctrl_c() => warn!("interrupted; winding down early"),
    }
    stop.store(true, Ordering::Relaxed);

    // In-flight iterations finish; nothing new starts past this point.
    for (id, handle) in users.into_iter().enumerate() {
        match handle.await {
            Ok(session) => debug!(user = id, balance = session.balance(), "virtual user done"),
            Err(err) => error!(user = id, "virtual user panicked: {err}"),
        }
    }

    let report = aggregator.collect(start.elapsed());
    info!(
        "run complete: {} requests, {:.2}% failed",
        report.total_requests(),
        report.error_rate() * 100.
    );
    Ok(report)
}
