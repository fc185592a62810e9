// ── Optimistic control state ──
//
// A requested value is shown immediately while its command runs. It is
// kept until the next poll confirms it, and dropped at once if the device
// rejects the command.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::command::CommandResult;
use crate::controls::{ControlDescriptor, ControlValue, find_control};
use crate::error::CoreError;
use crate::poller::Poller;

/// Display state of one control between a write and its confirmation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OptimisticState<T> {
    #[default]
    Idle,
    Pending(T),
}

impl<T: Clone> OptimisticState<T> {
    pub fn begin(&mut self, value: T) {
        *self = Self::Pending(value);
    }

    /// The write failed; fall back to the device value.
    pub fn revert(&mut self) {
        *self = Self::Idle;
    }

    /// A newer snapshot arrived; device state is authoritative again.
    pub fn confirm(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Value to display given the last value read from the device.
    pub fn displayed(&self, confirmed: Option<T>) -> Option<T> {
        match self {
            Self::Idle => confirmed,
            Self::Pending(value) => Some(value.clone()),
        }
    }
}

/// A control bound to a poller, with optimistic display state.
pub struct ControlHandle {
    descriptor: &'static ControlDescriptor,
    poller: Poller,
    state: Mutex<OptimisticState<ControlValue>>,
    /// Snapshot time at which the pending value was set.
    pending_since: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
}

impl ControlHandle {
    pub fn new(poller: Poller, key: &str) -> Result<Self, CoreError> {
        Ok(Self {
            descriptor: find_control(key)?,
            poller,
            state: Mutex::new(OptimisticState::Idle),
            pending_since: Mutex::new(None),
        })
    }

    pub fn descriptor(&self) -> &'static ControlDescriptor {
        self.descriptor
    }

    /// Current value: the pending one if a write is outstanding and no
    /// newer snapshot has arrived, the device's otherwise.
    pub fn value(&self) -> Option<ControlValue> {
        let snapshot = self.poller.snapshot();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let since = *self
            .pending_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if snapshot
            .as_ref()
            .zip(since)
            .is_some_and(|(snap, since)| snap.fetched_at > since)
        {
            state.confirm();
        }

        state.displayed(snapshot.and_then(|s| (self.descriptor.read)(&s)))
    }

    pub fn is_available(&self) -> bool {
        self.descriptor
            .is_available(self.poller.snapshot().as_deref())
    }

    /// Validate and apply a new value.
    ///
    /// Invalid or unavailable values are rejected before anything is sent.
    pub async fn set(&self, value: ControlValue) -> Result<CommandResult, CoreError> {
        let snapshot = self.poller.snapshot();
        let command = self.descriptor.command_for(&value, snapshot.as_deref())?;
        let shown = self.descriptor.validate(&value)?;

        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .begin(shown);
        *self
            .pending_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = snapshot.map(|s| s.fetched_at);

        let result = self.poller.execute(command).await;

        // Applied values stay pending until a newer snapshot arrives.
        if !matches!(result, Ok(CommandResult::Applied)) {
            debug!(control = self.descriptor.key, "write failed, reverting");
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .revert();
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::PollerConfig;

    #[test]
    fn pending_value_shadows_device_value() {
        let mut state = OptimisticState::Idle;
        assert_eq!(state.displayed(Some(40)), Some(40));

        state.begin(55);
        assert!(state.is_pending());
        assert_eq!(state.displayed(Some(40)), Some(55));

        state.confirm();
        assert_eq!(state.displayed(Some(55)), Some(55));
    }

    #[test]
    fn revert_restores_device_value() {
        let mut state = OptimisticState::Idle;
        state.begin(true);
        state.revert();
        assert!(!state.is_pending());
        assert_eq!(state.displayed(Some(false)), Some(false));
    }

    #[test]
    fn unknown_key_fails_construction() {
        let poller = Poller::new(PollerConfig::new("127.0.0.1"));
        assert!(ControlHandle::new(poller, "missing").is_err());
    }

    #[tokio::test]
    async fn invalid_value_is_rejected_before_sending() {
        let poller = Poller::new(PollerConfig::new("127.0.0.1"));
        let handle = ControlHandle::new(poller, "boiler_target").unwrap();

        let err = handle.set(ControlValue::Number(90.0)).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert_eq!(handle.value(), None);
    }

    #[tokio::test]
    async fn failed_send_reverts() {
        let poller = Poller::new(PollerConfig::new("127.0.0.1"));
        let handle = ControlHandle::new(poller, "boiler_target").unwrap();

        let err = handle.set(ControlValue::Number(50.0)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotConnected));
        assert_eq!(handle.value(), None);
    }
}
