// Common test utilities

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;

use atelier_host::dialog::FolderPicker;
use atelier_host::ipc::protocol::{Event, PickerOptions};

/// Picker that answers every prompt with a fixed path (or cancellation).
#[allow(dead_code)]
pub struct ScriptedPicker {
    pub folder: Option<PathBuf>,
}

#[async_trait]
impl FolderPicker for ScriptedPicker {
    async fn pick_folder(&self, _options: &PickerOptions) -> Option<PathBuf> {
        self.folder.clone()
    }

    async fn pick_new_folder(&self) -> Option<PathBuf> {
        self.folder.clone()
    }
}

/// Receive events until one matches `predicate`, panicking when the
/// timeout elapses first. Non-matching events are discarded.
#[allow(dead_code)]
pub async fn wait_for_event(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    mut predicate: impl FnMut(&Event) -> bool,
) -> Event {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .expect("timed out waiting for event");
        let event = match tokio::time::timeout(remaining, events.recv())
            .await
            .expect("timed out waiting for event")
        {
            Ok(event) => event,
            // A burst outran the channel; keep looking at what's left.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
        };
        if predicate(&event) {
            return event;
        }
    }
}

/// Drain everything currently buffered on the receiver, skipping over
/// lag markers from bursts that outran the channel.
#[allow(dead_code)]
pub fn drain_events(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut drained = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => drained.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    drained
}
