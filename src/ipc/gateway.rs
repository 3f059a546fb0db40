//! Request routing between the presentation layer and the core
//! components.
//!
//! The gateway owns the open-file registry, the terminal manager and
//! the event hub. It validates arguments, dispatches, and translates
//! failures into the wire taxonomy; it performs no business logic of
//! its own.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::dialog::FolderPicker;
use crate::error::{HostError, Result};
use crate::fs::{ops, scanner};
use crate::ipc::protocol::{
    Command, Event, FolderSelection, Request, Response, SaveFileItem, SaveOutcome,
};
use crate::terminal::{TerminalManager, TerminalSettings};
use crate::workspace::OpenFileRegistry;

/// Buffered events per listener before a slow listener starts losing
/// them; delivery is at-most-once by contract.
const EVENT_CAPACITY: usize = 256;

pub struct Gateway {
    registry: Mutex<OpenFileRegistry>,
    terminal: TerminalManager,
    picker: Arc<dyn FolderPicker>,
    events: broadcast::Sender<Event>,
}

impl Gateway {
    pub fn new(settings: TerminalSettings, picker: Arc<dyn FolderPicker>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let terminal = TerminalManager::new(settings, events.clone());
        Self {
            registry: Mutex::new(OpenFileRegistry::new()),
            terminal,
            picker,
            events,
        }
    }

    /// Register a listener for pushed events. Registration lives as
    /// long as the receiver; dropping it deregisters.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Push an event to every registered listener. This is how the
    /// embedder forwards menu intents.
    pub fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }

    pub fn terminal(&self) -> &TerminalManager {
        &self.terminal
    }

    /// Tear down background activity; called on window close and
    /// process exit.
    pub fn shutdown(&self) {
        self.terminal.destroy();
    }

    /// Dispatch a fire-and-forget command. Never fails: failures are
    /// either surfaced as events (`terminal:failed`) or logged.
    pub fn handle_command(&self, command: Command) {
        match command {
            Command::TerminalCreate => {
                // PTY spawn does blocking syscalls; keep it off the
                // protocol loop. Outcome arrives as ready/failed event.
                let terminal = self.terminal.clone();
                tokio::task::spawn_blocking(move || {
                    let _ = terminal.create();
                });
            }
            Command::TerminalWrite { data } => self.terminal.write(data.as_bytes()),
            Command::TerminalResize { cols, rows } => self.terminal.resize(cols, rows),
            Command::TerminalDestroy => self.terminal.destroy(),
        }
    }

    /// Dispatch a request/response operation.
    pub async fn handle_request(&self, request: Request) -> Result<Response> {
        match request {
            Request::ScanDirectory { path } => {
                let path = require_path(&path)?;
                Ok(Response::Tree(scanner::scan(&path).await))
            }

            Request::ReadFile { path } => {
                let path = require_path(&path)?;
                let text = ops::read_file(&path).await?;
                // Reading a file is what opens it: seed the registry so
                // dirty tracking starts from the on-disk content.
                self.registry.lock().unwrap().open(&path, text.clone());
                Ok(Response::Text(text))
            }

            Request::WriteFile { path, content } => {
                let path = require_path(&path)?;
                ops::write_file(&path, &content).await?;
                Ok(Response::ok())
            }

            Request::SaveFile { path, content } => {
                let path = require_path(&path)?;
                ops::write_file(&path, &content).await?;
                self.registry.lock().unwrap().mark_saved_with(&path, content);
                Ok(Response::ok())
            }

            Request::SaveAllFiles { files } => self.save_all(files).await,

            Request::SaveOpenFiles => {
                let dirty = self.registry.lock().unwrap().dirty_files();
                let files = dirty
                    .into_iter()
                    .map(|(path, content)| SaveFileItem {
                        path: path.display().to_string(),
                        content,
                    })
                    .collect();
                self.save_all(files).await
            }

            Request::MakeDirectory { path } => {
                let path = require_path(&path)?;
                ops::make_directory(&path).await?;
                Ok(Response::ok())
            }

            Request::CheckExists { path } => {
                let path = require_path(&path)?;
                Ok(Response::Exists(ops::exists(&path).await?))
            }

            Request::PromptSelectFolder { options } => {
                let Some(path) = self.picker.pick_folder(&options).await else {
                    info!("folder selection cancelled");
                    return Ok(Response::Folder(None));
                };
                let contents = if options.skip_contents {
                    Vec::new()
                } else {
                    scanner::scan(&path).await
                };
                Ok(Response::Folder(Some(FolderSelection { path, contents })))
            }

            Request::PromptCreateFolder => {
                let Some(path) = self.picker.pick_new_folder().await else {
                    info!("folder creation cancelled");
                    return Ok(Response::Folder(None));
                };
                ops::make_directory(&path).await?;
                let contents = scanner::scan(&path).await;
                Ok(Response::Folder(Some(FolderSelection { path, contents })))
            }

            Request::UpdateFile { path, content } => {
                let path = require_path(&path)?;
                let status = self.registry.lock().unwrap().edit(&path, content);
                Ok(Response::Status(status))
            }

            Request::CloseFile { path } => {
                let path = require_path(&path)?;
                self.registry.lock().unwrap().close(&path);
                Ok(Response::ok())
            }

            Request::FileStatus { path } => {
                let path = require_path(&path)?;
                Ok(Response::Status(self.registry.lock().unwrap().status(&path)))
            }
        }
    }

    /// One concurrent write per file; the reply settles only after
    /// every write has, and reports success or failure per path.
    async fn save_all(&self, files: Vec<SaveFileItem>) -> Result<Response> {
        // Validate everything before the first write starts.
        let mut validated = Vec::with_capacity(files.len());
        for item in files {
            let path = require_path(&item.path)?;
            validated.push((item.path, path, item.content));
        }

        let mut writes = JoinSet::new();
        for (wire_path, path, content) in validated {
            writes.spawn(async move {
                let outcome = ops::write_file(&path, &content).await;
                (wire_path, path, content, outcome)
            });
        }

        let mut outcomes = BTreeMap::new();
        let mut committed = Vec::new();
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((wire_path, path, content, Ok(()))) => {
                    committed.push((path, content));
                    outcomes.insert(wire_path, SaveOutcome::success());
                }
                Ok((wire_path, path, _, Err(err))) => {
                    error!(path = %path.display(), error = %err, "save-all write failed");
                    outcomes.insert(wire_path, SaveOutcome::failure(&err));
                }
                Err(err) => {
                    error!(error = %err, "save-all task failed");
                }
            }
        }

        let mut registry = self.registry.lock().unwrap();
        for (path, content) in committed {
            registry.mark_saved_with(&path, content);
        }
        Ok(Response::SaveAll(outcomes))
    }
}

fn require_path(path: &str) -> Result<PathBuf> {
    if path.trim().is_empty() {
        return Err(HostError::InvalidArgument("path is required".to_string()));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::HeadlessPicker;

    fn gateway() -> Gateway {
        Gateway::new(TerminalSettings::default(), Arc::new(HeadlessPicker))
    }

    #[tokio::test]
    async fn empty_path_is_rejected_before_dispatch() {
        let gw = gateway();
        for request in [
            Request::ScanDirectory { path: "".into() },
            Request::ReadFile { path: "  ".into() },
            Request::MakeDirectory { path: "".into() },
            Request::CheckExists { path: "".into() },
        ] {
            let err = gw.handle_request(request).await.unwrap_err();
            assert!(matches!(err, HostError::InvalidArgument(_)));
        }
    }

    #[tokio::test]
    async fn headless_picker_reports_cancellation_as_null() {
        let gw = gateway();
        let response = gw
            .handle_request(Request::PromptSelectFolder {
                options: Default::default(),
            })
            .await
            .unwrap();
        assert!(matches!(response, Response::Folder(None)));
    }
}
