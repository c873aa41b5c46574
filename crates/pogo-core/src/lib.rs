mod app_config;
mod config;
mod records;

pub use app_config::{AppConfig, SleepWindow};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{
    is_valid_friend_code, normalize_friend_code, FriendRecord, StampedFriend, Team,
    NO_CODE, UNKNOWN_LEVEL, UNKNOWN_LOCATION, UNKNOWN_NAME,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
