use crate::constants::INITIAL_BALANCE;

/// Private state one virtual user carries across iterations.
///
/// Each session is moved into its owner's task at spawn time; no two tasks
/// ever hold the same session, so no locking is involved.
#[derive(Clone, Debug)]
pub(crate) struct Session {
    token: Option<String>,
    balance: i64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            token: None,
            balance: INITIAL_BALANCE,
        }
    }

    /// Cached credential, present once an auth attempt has happened. An empty
    /// string means the attempt failed; it stays cached so auth is never
    /// retried.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn cache_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// The shop grants a fresh balance alongside a fresh token.
    pub fn reset_balance(&mut self) {
        self.balance = INITIAL_BALANCE;
    }

    /// Optimistic local debit; never reconciled against the server.
    pub fn debit(&mut self, amount: i64) {
        self.balance -= amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PURCHASE_COST, TRANSFER_AMOUNT};

    #[test]
    fn starts_unauthenticated_with_full_balance() {
        let session = Session::new();
        assert!(session.token().is_none());
        assert_eq!(session.balance(), 1000);
    }

    #[test]
    fn empty_token_still_counts_as_cached() {
        let mut session = Session::new();
        session.cache_token(String::new());
        assert_eq!(session.token(), Some(""));
    }

    #[test]
    fn debits_may_go_negative() {
        let mut session = Session::new();
        for _ in 0..17 {
            session.debit(TRANSFER_AMOUNT);
            session.debit(PURCHASE_COST);
        }
        assert_eq!(session.balance(), 1000 - 17 * 60);
    }

    #[test]
    fn reset_restores_initial_balance() {
        let mut session = Session::new();
        session.debit(990);
        session.reset_balance();
        assert_eq!(session.balance(), 1000);
    }
}
