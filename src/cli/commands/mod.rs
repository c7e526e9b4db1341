//! Command implementations

pub mod export;
pub mod import;
pub mod init;
pub mod validate;

use crate::adapters::platform::HttpPlatformGateway;
use crate::config::FerryConfig;
use crate::console::{AlwaysConfirm, ConfirmPrompt, StdinConfirm};
use crate::domain::FerryError;
use std::sync::Arc;

/// Exit codes shared by the transfer commands.
///
/// 0 success, 1 per-type failures, 2 configuration error, 3 operator abort,
/// 4 data-integrity abort, 5 fatal.
pub(crate) fn exit_code_for(error: &FerryError) -> i32 {
    match error {
        FerryError::Configuration(_) => 2,
        FerryError::Aborted(_) => 3,
        FerryError::DuplicateIds { .. } => 4,
        _ => 5,
    }
}

pub(crate) fn build_gateway(config: &FerryConfig) -> anyhow::Result<Arc<HttpPlatformGateway>> {
    Ok(Arc::new(HttpPlatformGateway::new(&config.platform)?))
}

pub(crate) fn build_confirm(assume_yes: bool) -> Arc<dyn ConfirmPrompt> {
    if assume_yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinConfirm)
    }
}
