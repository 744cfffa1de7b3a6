use crate::constants::{DEFAULT_DURATION, DEFAULT_PACING, DEFAULT_USERS};
use crate::error::Error;
use std::fmt;
use std::time::Duration;

/// Immutable configuration for a single run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Target service base URL; endpoints live under `/api`.
    pub base_url: String,
    /// Virtual-user population size; all users are live from time zero.
    pub users: usize,
    /// Wall-clock bound for the run.
    pub duration: Duration,
    /// Idle interval each user sleeps between iterations.
    pub pacing: Duration,
}

impl RunConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            users: DEFAULT_USERS,
            duration: DEFAULT_DURATION,
            pacing: DEFAULT_PACING,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.users == 0 {
            return Err(Error::NoUsers);
        }
        url::Url::parse(&self.base_url).map_err(|source| Error::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        Ok(())
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} users against {} for {}",
            self.users,
            self.base_url,
            humantime::format_duration(self.duration)
        )
    }
}
