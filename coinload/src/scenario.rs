//! The per-iteration workflow a virtual user repeats.

use crate::client::ShopApi;
use crate::constants::{
    ITEM_TO_BUY, PURCHASE_COST, SHARED_PASSWORD, TRANSFER_AMOUNT, USERNAME_PREFIX,
};
use crate::error::Error;
use crate::report::{Aggregator, Check};
use crate::session::Session;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// One simulated client identity plus the state it carries between
/// iterations. Owned by exactly one task for the whole run.
pub(crate) struct VirtualUser<A> {
    id: usize,
    population: usize,
    session: Session,
    api: A,
    aggregator: Arc<Aggregator>,
    pacing: Duration,
}

impl<A: ShopApi> VirtualUser<A> {
    pub fn new(
        id: usize,
        population: usize,
        session: Session,
        api: A,
        aggregator: Arc<Aggregator>,
        pacing: Duration,
    ) -> Self {
        Self {
            id,
            population,
            session,
            api,
            aggregator,
            pacing,
        }
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    fn username(&self) -> String {
        format!("{USERNAME_PREFIX}{}", self.id)
    }

    /// Next user in the ring; the last user wraps around to user 0.
    fn transfer_target(&self) -> String {
        format!("{USERNAME_PREFIX}{}", (self.id + 1) % self.population)
    }

    /// One full pass of the workload: ensure a token, hit the info endpoint,
    /// then transfer and purchase while the synthetic balance lasts, then
    /// idle.
    pub async fn run_iteration(&mut self) {
        if self.session.token().is_none() {
            self.authenticate_once().await;
        }
        let token = self.session.token().unwrap_or_default().to_string();

        self.checked(Check::Info, self.api.info(&token)).await;

        if self.session.balance() > 0 {
            let target = self.transfer_target();
            self.checked(
                Check::SendCoin,
                self.api.send_coin(&token, &target, TRANSFER_AMOUNT),
            )
            .await;
            // Debited whether or not the server accepted the transfer.
            self.session.debit(TRANSFER_AMOUNT);
        }

        if self.session.balance() > 0 {
            self.checked(Check::BuyItem, self.api.buy(&token, ITEM_TO_BUY))
                .await;
            self.session.debit(PURCHASE_COST);
        }

        tokio::time::sleep(self.pacing).await;
    }

    /// One permanent auth attempt per user: whatever comes back (including
    /// nothing) is cached, so `/api/auth` is never issued twice.
    async fn authenticate_once(&mut self) {
        let username = self.username();
        let start = Instant::now();
        let res = self.api.authenticate(&username, SHARED_PASSWORD).await;
        let elapsed = start.elapsed();

        match res {
            Ok(reply) => {
                self.aggregator
                    .record(Check::Auth, reply.status == 200, elapsed);
                let token = reply.token.unwrap_or_default();
                if !token.is_empty() {
                    self.session.reset_balance();
                }
                self.session.cache_token(token);
            }
            Err(err) => {
                debug!(user = self.id, "auth transport failure: {err}");
                self.aggregator.record(Check::Auth, false, elapsed);
                self.session.cache_token(String::new());
            }
        }
    }

    /// Awaits a request, recording the named check; a transport failure is a
    /// failed check, never a failed user.
    async fn checked(&self, check: Check, request: impl Future<Output = Result<u16, Error>>) {
        let start = Instant::now();
        let res = request.await;
        let elapsed = start.elapsed();

        let passed = matches!(res, Ok(200));
        if let Err(err) = res {
            debug!(user = self.id, check = check.name(), "request failed: {err}");
        }
        self.aggregator.record(check, passed, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub::StubShop;
    use crate::report::RunReport;

    fn user(id: usize, population: usize, api: &StubShop) -> VirtualUser<StubShop> {
        VirtualUser::new(
            id,
            population,
            Session::new(),
            api.clone(),
            Arc::new(Aggregator::new()),
            Duration::from_millis(10),
        )
    }

    fn report(user: &VirtualUser<StubShop>) -> RunReport {
        user.aggregator.collect(Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_debits_sixty_per_iteration() {
        let api = StubShop::default();
        let mut user = user(0, 100, &api);

        user.run_iteration().await;
        assert_eq!(user.session.balance(), 940);
        assert_eq!(user.session.token(), Some("stub-token"));

        let state = api.state();
        assert_eq!(state.auth_calls, 1);
        assert_eq!(state.info_calls, 1);
        assert_eq!(state.transfers, vec![("testuser1".to_string(), 10)]);
        assert_eq!(state.purchases, vec!["book".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn balance_exhaustion_sequence() {
        let api = StubShop::default();
        let mut user = user(0, 100, &api);

        for _ in 0..16 {
            user.run_iteration().await;
        }
        assert_eq!(user.session.balance(), 40);

        // Both actions still fire: 40 > 0, then 30 > 0 after the transfer.
        user.run_iteration().await;
        assert_eq!(user.session.balance(), -20);

        user.run_iteration().await;
        assert_eq!(user.session.balance(), -20);

        let state = api.state();
        assert_eq!(state.transfers.len(), 17);
        assert_eq!(state.purchases.len(), 17);
        assert_eq!(state.info_calls, 18);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_auth_is_never_retried() {
        let api = StubShop::default();
        {
            let mut state = api.state();
            state.auth_status = 401;
            state.token = None;
        }
        let mut user = user(3, 100, &api);

        for _ in 0..3 {
            user.run_iteration().await;
        }

        assert_eq!(api.state().auth_calls, 1);
        assert_eq!(user.session.token(), Some(""));

        let report = report(&user);
        assert_eq!(report.check(Check::Auth).failed, 1);
        assert_eq!(report.check(Check::Info).total(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_token_resets_a_drained_balance() {
        let api = StubShop::default();
        let mut session = Session::new();
        session.debit(600);
        let mut user = VirtualUser::new(
            0,
            100,
            session,
            api.clone(),
            Arc::new(Aggregator::new()),
            Duration::from_millis(10),
        );

        user.run_iteration().await;
        // Reset to 1000 on auth, then the usual 60 off.
        assert_eq!(user.session.balance(), 940);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_requests_still_debit() {
        let api = StubShop::default();
        api.state().status = 500;
        let mut user = user(0, 100, &api);

        user.run_iteration().await;
        assert_eq!(user.session.balance(), 940);

        let report = report(&user);
        assert_eq!(report.check(Check::Auth).passed, 1);
        assert_eq!(report.check(Check::Info).failed, 1);
        assert_eq!(report.check(Check::SendCoin).failed, 1);
        assert_eq!(report.check(Check::BuyItem).failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_records_failed_checks_and_continues() {
        let api = StubShop::default();
        api.state().fail_transport = true;
        let mut user = user(0, 100, &api);

        user.run_iteration().await;
        assert_eq!(user.session.balance(), 940);
        assert_eq!(user.session.token(), Some(""));

        let report = report(&user);
        assert_eq!(report.total_requests(), 4);
        assert_eq!(report.total_failed(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn ring_target_wraps_to_user_zero() {
        let api = StubShop::default();
        let mut user = user(3, 4, &api);

        user.run_iteration().await;
        assert_eq!(api.state().transfers, vec![("testuser0".to_string(), 10)]);
    }
}
