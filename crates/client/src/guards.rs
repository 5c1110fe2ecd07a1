//! Request-lifetime helpers for views.
//!
//! - [`SubmitGuard`] refuses a second create/update while one is in flight.
//! - [`Mounted`] and [`MountToken`] drop results that arrive after the view
//!   that asked for them went away.
//! - [`Loadable`] is the loading/ready/failed state of a fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ClientError, Result};

/// Single-flight gate for form submissions.
///
/// Clones share the same gate.
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one submission; releases the gate on drop.
#[derive(Debug)]
#[must_use = "the submission ends when this is dropped"]
pub struct Submission {
    busy: Arc<AtomicBool>,
}

impl SubmitGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a submission.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SubmissionInFlight` if another submission holds
    /// the gate.
    pub fn begin(&self) -> Result<Submission> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Submission rejected: already in flight");
            return Err(ClientError::SubmissionInFlight);
        }
        Ok(Submission {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Whether a submission is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Mount state of a view. Dropping it (or calling [`Mounted::unmount`])
/// invalidates every token handed out.
#[derive(Debug)]
pub struct Mounted {
    alive: Arc<AtomicBool>,
}

/// Handle carried by an in-flight request to check its view is still there.
#[derive(Debug, Clone)]
pub struct MountToken {
    alive: Arc<AtomicBool>,
}

impl Mounted {
    #[must_use]
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn token(&self) -> MountToken {
        MountToken {
            alive: Arc::clone(&self.alive),
        }
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl Default for Mounted {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl MountToken {
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Apply `value` only if the view is still mounted.
    ///
    /// Returns whether it was applied.
    pub fn deliver<T>(&self, value: T, apply: impl FnOnce(T)) -> bool {
        if self.is_mounted() {
            apply(value);
            true
        } else {
            tracing::debug!("Dropping result for unmounted view");
            false
        }
    }
}

/// State of a fetch shown by a view.
#[derive(Debug)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(ClientError),
}

impl<T> Loadable<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Mutable access to the loaded value.
    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> From<Result<T>> for Loadable<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_second_submission_rejected_until_first_ends() {
        let guard = SubmitGuard::new();
        let first = guard.begin().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(
            guard.clone().begin(),
            Err(ClientError::SubmissionInFlight)
        ));

        drop(first);
        assert!(!guard.is_busy());
        let _second = guard.begin().unwrap();
    }

    #[test]
    fn test_submission_released_on_error_path() {
        let guard = SubmitGuard::new();
        let attempt = || -> Result<()> {
            let _submission = guard.begin()?;
            Err(ClientError::validation("Invalid price"))
        };
        assert!(attempt().is_err());
        assert!(!guard.is_busy());
    }

    #[test]
    fn test_results_after_unmount_are_dropped() {
        let view = Mounted::new();
        let token = view.token();
        let mut applied = Vec::new();

        assert!(token.deliver(1, |v| applied.push(v)));
        view.unmount();
        assert!(!token.is_mounted());
        assert!(!token.deliver(2, |v| applied.push(v)));
        assert_eq!(applied, vec![1]);
    }

    #[test]
    fn test_loadable_from_result() {
        let state: Loadable<u32> = Loadable::default();
        assert!(state.is_loading());

        let state = Loadable::from(Ok::<_, ClientError>(3));
        assert_eq!(state.ready(), Some(&3));

        let state: Loadable<u32> = Err(ClientError::NotFound("product #1".into())).into();
        assert!(state.error().is_some());
        assert!(state.ready().is_none());
    }
}
