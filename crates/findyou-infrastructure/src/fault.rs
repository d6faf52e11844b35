//! Injected failures for the in-memory stores.
//!
//! Lets tests and the demo CLI reproduce backend failures: a store can be
//! taken offline as a whole, or told to fail the next N writes that touch a
//! given key.

use std::collections::HashMap;

use findyou_core::FindYouError;
use findyou_core::error::FailureCause;

/// Builds the error a real backend would report for `cause`.
pub fn error_for(cause: FailureCause, key: &str) -> FindYouError {
    match cause {
        FailureCause::Network => FindYouError::data_unavailable(format!(
            "backend unreachable while writing '{}'",
            key
        )),
        FailureCause::Permission => {
            FindYouError::PermissionDenied(format!("write to '{}' refused", key))
        }
        FailureCause::NotFound => FindYouError::not_found("document", key),
    }
}

#[derive(Debug, Default)]
pub(crate) struct FaultPlan {
    offline: bool,
    pending: HashMap<String, (u32, FailureCause)>,
}

impl FaultPlan {
    pub(crate) fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub(crate) fn is_offline(&self) -> bool {
        self.offline
    }

    pub(crate) fn fail_next(&mut self, key: &str, times: u32, cause: FailureCause) {
        if times == 0 {
            self.pending.remove(key);
        } else {
            self.pending.insert(key.to_string(), (times, cause));
        }
    }

    /// Fails when offline; otherwise consumes one planned failure for `key`.
    pub(crate) fn check(&mut self, key: &str) -> Result<(), FindYouError> {
        if self.offline {
            return Err(FindYouError::data_unavailable("backend offline"));
        }
        let Some((remaining, cause)) = self.pending.get_mut(key) else {
            return Ok(());
        };
        let cause = *cause;
        *remaining -= 1;
        if *remaining == 0 {
            self.pending.remove(key);
        }
        tracing::debug!(key, %cause, "Injected store failure");
        Err(error_for(cause, key))
    }
}
