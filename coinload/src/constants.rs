use std::time::Duration;

/// Synthetic balance a virtual user starts (and restarts) with.
pub const INITIAL_BALANCE: i64 = 1000;

/// Coins moved per `sendCoin` request.
pub const TRANSFER_AMOUNT: i64 = 10;

/// Synthetic cost of one purchase.
pub const PURCHASE_COST: i64 = 50;

/// Item every purchase targets.
pub const ITEM_TO_BUY: &str = "book";

/// Username prefix; the virtual user id is appended.
pub const USERNAME_PREFIX: &str = "testuser";

/// Password shared by every virtual user.
pub const SHARED_PASSWORD: &str = "password";

pub const DEFAULT_USERS: usize = 100;

pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);

/// Idle interval between iterations of a single user.
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);
