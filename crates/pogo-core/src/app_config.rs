use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

/// Inclusive bounds, in seconds, for the randomized pause between poll cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepWindow {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl SleepWindow {
    /// Draws a pause uniformly from `[min_secs, max_secs]`.
    ///
    /// Config loading guarantees `min_secs <= max_secs`; a hand-built
    /// inverted window collapses to `min_secs`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_secs >= self.max_secs {
            return Duration::from_secs(self.min_secs);
        }
        Duration::from_secs(rng.random_range(self.min_secs..=self.max_secs))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target_url: String,
    pub store_path: PathBuf,
    pub qr_enabled: bool,
    pub qr_base_path: PathBuf,
    pub warm_up_delay_secs: u64,
    pub settle_delay_secs: u64,
    pub sleep_window: SleepWindow,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub log_level: String,
}

impl AppConfig {
    #[must_use]
    pub fn warm_up_delay(&self) -> Duration {
        Duration::from_secs(self.warm_up_delay_secs)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}
