//! PTY-backed shell session lifecycle.
//!
//! The process models at most one interactive shell at a time. The
//! manager owns the session exclusively: the PTY master for resizes,
//! the child killer for teardown, the input writer, and the reader
//! thread that pumps output into the event hub. Everyone else talks to
//! the session through messages, never through the handles.
//!
//! Lifecycle: `Absent -> Starting -> Running -> Terminated`, back to
//! `Running` only through a fresh `create()`. A `create()` while a
//! session is running kills and replaces it (last caller wins); the
//! internal lock makes two racing creates resolve deterministically to
//! a single surviving session.

use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, Weak};

use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{HostError, Result};
use crate::ipc::protocol::Event;

/// Default grid the shell starts with until the renderer reports its
/// real dimensions.
pub const DEFAULT_COLS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 30;

/// How a session is spawned.
#[derive(Debug, Clone)]
pub struct TerminalSettings {
    /// Shell binary to spawn; `None` uses [`detect_shell`].
    pub shell: Option<String>,
    pub cols: u16,
    pub rows: u16,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            shell: None,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

/// The platform default interactive shell.
pub fn detect_shell() -> String {
    if cfg!(windows) {
        "powershell.exe".to_string()
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "bash".to_string())
    }
}

/// Observable lifecycle state of the session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Starting,
    Running,
    Terminated,
}

struct Session {
    generation: u64,
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    cols: u16,
    rows: u16,
    /// Open while output may still be forwarded. Closed under its lock
    /// by `destroy()` before the kill, so no output event can be
    /// emitted after `destroy()` returns.
    gate: Arc<Mutex<bool>>,
}

struct Inner {
    state: SessionState,
    session: Option<Session>,
    /// Monotonic counter distinguishing a session from its successors,
    /// so a stale reader thread cannot clobber a newer session's state.
    generation: u64,
}

/// Owner of the singleton shell session.
#[derive(Clone)]
pub struct TerminalManager {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<Event>,
    settings: TerminalSettings,
}

impl TerminalManager {
    pub fn new(settings: TerminalSettings, events: broadcast::Sender<Event>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Absent,
                session: None,
                generation: 0,
            })),
            events,
            settings,
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    /// Current (cols, rows) of the running session, if any.
    pub fn dimensions(&self) -> Option<(u16, u16)> {
        let inner = self.inner.lock().unwrap();
        inner.session.as_ref().map(|s| (s.cols, s.rows))
    }

    /// Spawn the shell, replacing any session that is already running.
    ///
    /// The internal lock is held for the whole spawn, so concurrent
    /// calls serialize: the later caller kills the earlier caller's
    /// session and leaves exactly one running. Emits `terminal:ready`
    /// on success, `terminal:failed` on error; a failed spawn leaves
    /// the slot `Absent` so the next `create()` retries from scratch.
    pub fn create(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(mut session) = inner.session.take() {
            info!(generation = session.generation, "replacing running shell session");
            close_gate(&session.gate);
            let _ = session.killer.kill();
        }

        inner.state = SessionState::Starting;
        inner.generation += 1;
        let generation = inner.generation;

        match self.spawn_session(generation) {
            Ok(session) => {
                info!(generation, cols = session.cols, rows = session.rows, "shell session running");
                inner.session = Some(session);
                inner.state = SessionState::Running;
                let _ = self.events.send(Event::TerminalReady);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "shell spawn failed");
                inner.state = SessionState::Absent;
                let _ = self.events.send(Event::TerminalFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn spawn_session(&self, generation: u64) -> Result<Session> {
        let shell = self
            .settings
            .shell
            .clone()
            .unwrap_or_else(detect_shell);
        let (cols, rows) = (self.settings.cols, self.settings.rows);

        let pty = native_pty_system();
        let pair = pty
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| HostError::ProcessSpawn(format!("openpty failed: {err}")))?;

        let mut cmd = CommandBuilder::new(&shell);
        cmd.env("TERM", "xterm-256color");
        if let Some(home) = dirs::home_dir() {
            cmd.cwd(home);
        }

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|err| HostError::ProcessSpawn(format!("failed to spawn '{shell}': {err}")))?;
        let mut killer = child.clone_killer();
        // The slave side belongs to the child now.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| HostError::ProcessSpawn(format!("cannot clone PTY reader: {err}")))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|err| HostError::ProcessSpawn(format!("cannot take PTY writer: {err}")))?;

        // Reap the child so a self-exited shell does not linger as a
        // zombie; the reader thread observes the same exit as EOF.
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        let gate = Arc::new(Mutex::new(true));
        let thread_gate = Arc::clone(&gate);
        let thread_events = self.events.clone();
        let thread_inner = Arc::downgrade(&self.inner);
        let spawned = std::thread::Builder::new()
            .name(format!("pty-reader-{generation}"))
            .spawn(move || {
                read_loop(reader, thread_gate, thread_events, thread_inner, generation);
            });
        if let Err(err) = spawned {
            let _ = killer.kill();
            return Err(HostError::ProcessSpawn(format!(
                "cannot start reader thread: {err}"
            )));
        }

        Ok(Session {
            generation,
            master: pair.master,
            writer,
            killer,
            cols,
            rows,
            gate,
        })
    }

    /// Forward raw bytes to the shell's input. A no-op when no session
    /// is running.
    pub fn write(&self, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        let Some(session) = inner.session.as_mut() else {
            debug!("terminal write ignored; no running session");
            return;
        };
        if let Err(err) = session.writer.write_all(data).and_then(|()| session.writer.flush()) {
            warn!(error = %err, "failed to write to shell");
        }
    }

    /// Forward a size change to the PTY. A no-op when no session is
    /// running; identical dimensions are still forwarded.
    pub fn resize(&self, cols: u16, rows: u16) {
        let mut inner = self.inner.lock().unwrap();
        let Some(session) = inner.session.as_mut() else {
            debug!("terminal resize ignored; no running session");
            return;
        };
        session.cols = cols;
        session.rows = rows;
        if let Err(err) = session.master.resize(PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        }) {
            warn!(error = %err, cols, rows, "failed to resize PTY");
        }
    }

    /// Kill the shell and release the handles. Idempotent. Once this
    /// returns, no further output events are emitted for the killed
    /// session, even for bytes the reader picked up just before the
    /// kill.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock().unwrap();
        let Some(mut session) = inner.session.take() else {
            return;
        };
        close_gate(&session.gate);
        if let Err(err) = session.killer.kill() {
            warn!(error = %err, "failed to kill shell process");
        }
        inner.state = SessionState::Terminated;
        info!(generation = session.generation, "shell session destroyed");
    }
}

fn close_gate(gate: &Arc<Mutex<bool>>) {
    *gate.lock().unwrap() = false;
}

/// Pump PTY output into the event hub until EOF or destruction.
///
/// Lock order is `inner` then `gate`, same as the manager's teardown
/// paths.
fn read_loop(
    mut reader: Box<dyn Read + Send>,
    gate: Arc<Mutex<bool>>,
    events: broadcast::Sender<Event>,
    inner: Weak<Mutex<Inner>>,
    generation: u64,
) {
    let mut carry = Utf8Carry::default();
    let mut buf = [0u8; 8192];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let text = carry.push(&buf[..n]);
                if text.is_empty() {
                    continue;
                }
                let open = gate.lock().unwrap();
                if !*open {
                    // Destroyed while we were reading; drop the chunk.
                    return;
                }
                let _ = events.send(Event::TerminalOutput { data: text });
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!(error = %err, generation, "PTY reader stopped");
                break;
            }
        }
    }

    // EOF: the shell exited on its own or was killed. Only the current
    // session may transition the slot; a replaced session's reader must
    // not touch its successor's state.
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut inner = inner.lock().unwrap();
    if inner.generation != generation || inner.session.is_none() {
        return;
    }
    let open = *gate.lock().unwrap();
    inner.session = None;
    inner.state = SessionState::Terminated;
    if open {
        info!(generation, "shell exited on its own");
        let _ = events.send(Event::TerminalExited);
    }
}

/// Incremental UTF-8 decoding across read boundaries.
///
/// A chunk may end mid-character; the incomplete suffix is carried into
/// the next chunk instead of being replaced with U+FFFD. Genuinely
/// invalid bytes are decoded lossily.
#[derive(Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let buffered = std::mem::take(&mut self.pending);
        match String::from_utf8(buffered) {
            Ok(text) => text,
            Err(err) => {
                let utf8_err = err.utf8_error();
                let valid_up_to = utf8_err.valid_up_to();
                let incomplete_suffix = utf8_err.error_len().is_none();
                let bytes = err.into_bytes();
                if incomplete_suffix {
                    let text = String::from_utf8_lossy(&bytes[..valid_up_to]).into_owned();
                    self.pending = bytes[valid_up_to..].to_vec();
                    text
                } else {
                    String::from_utf8_lossy(&bytes).into_owned()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_carry_passes_complete_chunks_through() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.push(b"hello"), "hello");
        assert_eq!(carry.push("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn utf8_carry_joins_split_multibyte_characters() {
        let mut carry = Utf8Carry::default();
        let bytes = "ls → done".as_bytes();
        let (a, b) = bytes.split_at(4); // splits the arrow mid-sequence
        let first = carry.push(a);
        let second = carry.push(b);
        assert_eq!(format!("{first}{second}"), "ls → done");
        assert!(!first.contains('\u{fffd}'));
    }

    #[test]
    fn utf8_carry_replaces_invalid_bytes() {
        let mut carry = Utf8Carry::default();
        let text = carry.push(&[b'o', b'k', 0xff, b'!']);
        assert!(text.starts_with("ok"));
        assert!(text.contains('\u{fffd}'));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn default_settings_match_initial_grid() {
        let settings = TerminalSettings::default();
        assert_eq!((settings.cols, settings.rows), (80, 30));
        assert!(settings.shell.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn detect_shell_honors_shell_env() {
        // SHELL is set in any sane Unix test environment; fall back is
        // bash either way, so this cannot flake.
        let shell = detect_shell();
        assert!(!shell.is_empty());
    }
}
