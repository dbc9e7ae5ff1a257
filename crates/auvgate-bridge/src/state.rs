use std::sync::Arc;

use auvgate_control::{ControlConfig, ControlError, Parcel, VehicleState};
use auvgate_frame::StateFrame;
use bytes::Bytes;
use tokio::sync::{Mutex, MutexGuard};

/// Shared handle to the vehicle state.
///
/// Every operation holds the lock for its whole duration and never
/// across I/O.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<Mutex<VehicleState>>,
}

impl StateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: VehicleState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Merge one raw control message. See [`VehicleState::merge`].
    pub async fn merge(&self, payload: &[u8], config: &ControlConfig) -> Result<(), ControlError> {
        self.inner.lock().await.merge(payload, config)
    }

    /// Select the parcel for the next reply and encode it.
    pub async fn next_reply(&self) -> (Parcel, Bytes) {
        let state = self.inner.lock().await;
        let parcel = state.next_parcel();
        let frame = parcel.encode();
        (parcel, frame)
    }

    pub async fn acknowledge(&self, parcel: &Parcel) {
        self.inner.lock().await.acknowledge(parcel);
    }

    pub async fn halt(&self) {
        self.inner.lock().await.halt();
    }

    pub async fn snapshot(&self) -> StateFrame {
        self.inner.lock().await.snapshot()
    }

    /// Direct access, for inspection and embedding.
    pub async fn lock(&self) -> MutexGuard<'_, VehicleState> {
        self.inner.lock().await
    }
}

#[cfg(test)]
mod tests {
    use auvgate_frame::{decode_command, Command, TuningChannel};

    use super::*;

    #[tokio::test]
    async fn clones_share_one_state() {
        let handle = StateHandle::new();
        let other = handle.clone();

        handle
            .merge(br#"{"thrust_x": 40}"#, &ControlConfig::default())
            .await
            .expect("update should apply");

        assert_eq!(other.snapshot().await.thrust_x, 40);
    }

    #[tokio::test]
    async fn rejected_merge_halts() {
        let handle = StateHandle::new();
        let config = ControlConfig::default();
        handle
            .merge(br#"{"thrust_y": -30, "pid": {"yaw": true}}"#, &config)
            .await
            .expect("update should apply");

        let err = handle.merge(b"{not json", &config).await;
        assert!(matches!(err, Err(ControlError::InvalidJson(_))));
        assert!(handle.lock().await.is_halted());
    }

    #[tokio::test]
    async fn next_reply_encodes_selected_parcel() {
        let handle = StateHandle::new();
        handle
            .merge(
                br#"{"tuning": [{"type": "yaw", "p": 1.0, "i": 0.5, "d": 0.25}]}"#,
                &ControlConfig::default(),
            )
            .await
            .expect("update should apply");

        let (parcel, frame) = handle.next_reply().await;
        assert_eq!(parcel.kind(), "tuning");
        match decode_command(&frame).expect("reply should decode") {
            Command::Tuning(tuning) => assert_eq!(tuning.channel, TuningChannel::Yaw),
            other => panic!("unexpected command {other:?}"),
        }

        handle.acknowledge(&parcel).await;
        let (parcel, _) = handle.next_reply().await;
        assert_eq!(parcel.kind(), "state");
    }

    #[tokio::test]
    async fn halt_through_handle() {
        let mut state = VehicleState::new();
        state.thrust_z = 90;
        let handle = StateHandle::from_state(state);
        handle.halt().await;
        assert_eq!(handle.snapshot().await.thrust_z, 0);
    }
}
