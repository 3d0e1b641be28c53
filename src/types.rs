use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What kind of thing a descriptor launches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProcessType {
    #[default]
    Executable,
    Service,
    File,
}

impl FromStr for ProcessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "executable" => Ok(ProcessType::Executable),
            "service" => Ok(ProcessType::Service),
            "file" => Ok(ProcessType::File),
            other => Err(format!(
                "invalid process type: {other} (expected \"executable\", \"service\" or \"file\")"
            )),
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessType::Executable => "executable",
            ProcessType::Service => "service",
            ProcessType::File => "file",
        };
        f.write_str(s)
    }
}

/// How a process is launched.
///
/// - `Exec`: shell command line, output buffered until exit.
/// - `Spawn`: no shell, stdout/stderr streamed chunk by chunk.
/// - `ExecFile`: run the image directly, output buffered until exit.
/// - `Fork`: worker with an inherited communication channel on stdin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    #[default]
    Exec,
    Spawn,
    #[serde(alias = "execFile")]
    ExecFile,
    Fork,
}

impl FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exec" => Ok(ExecutionStrategy::Exec),
            "spawn" => Ok(ExecutionStrategy::Spawn),
            "exec_file" | "execfile" => Ok(ExecutionStrategy::ExecFile),
            "fork" => Ok(ExecutionStrategy::Fork),
            other => Err(format!(
                "invalid execution strategy: {other} (expected exec, spawn, exec_file or fork)"
            )),
        }
    }
}

/// Standard stream wiring for launched processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdioMode {
    Inherit,
    #[default]
    Pipe,
    Null,
}

/// Signals `kill` knows how to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Hangup,
    Interrupt,
    Quit,
    Kill,
    Terminate,
    User1,
    User2,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Hangup => "SIGHUP",
            Signal::Interrupt => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::Kill => "SIGKILL",
            Signal::Terminate => "SIGTERM",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    pub fn to_nix(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal as Nix;
        match self {
            Signal::Hangup => Nix::SIGHUP,
            Signal::Interrupt => Nix::SIGINT,
            Signal::Quit => Nix::SIGQUIT,
            Signal::Kill => Nix::SIGKILL,
            Signal::Terminate => Nix::SIGTERM,
            Signal::User1 => Nix::SIGUSR1,
            Signal::User2 => Nix::SIGUSR2,
        }
    }

    /// Map a raw signal number (as found in an exit status) back to a
    /// known signal. Unknown numbers yield `None`.
    #[cfg(unix)]
    pub fn from_raw(raw: i32) -> Option<Self> {
        use nix::sys::signal::Signal as Nix;
        match Nix::try_from(raw).ok()? {
            Nix::SIGHUP => Some(Signal::Hangup),
            Nix::SIGINT => Some(Signal::Interrupt),
            Nix::SIGQUIT => Some(Signal::Quit),
            Nix::SIGKILL => Some(Signal::Kill),
            Nix::SIGTERM => Some(Signal::Terminate),
            Nix::SIGUSR1 => Some(Signal::User1),
            Nix::SIGUSR2 => Some(Signal::User2),
            _ => None,
        }
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        match bare {
            "HUP" => Ok(Signal::Hangup),
            "INT" => Ok(Signal::Interrupt),
            "QUIT" => Ok(Signal::Quit),
            "KILL" => Ok(Signal::Kill),
            "TERM" => Ok(Signal::Terminate),
            "USR1" => Ok(Signal::User1),
            "USR2" => Ok(Signal::User2),
            _ => Err(format!("unsupported signal: {}", s.trim())),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle and signal events a supervised process can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleEvent {
    /// The process exited on its own (or by a signal outside this set).
    Exit,
    Hangup,
    Quit,
    Kill,
    Interrupt,
    Terminate,
    User1,
    User2,
    /// The supervisor lost track of the process (wait failed).
    Fault,
}

impl LifecycleEvent {
    /// The fixed set of events every launch listens for.
    pub const ALL: [LifecycleEvent; 9] = [
        LifecycleEvent::Exit,
        LifecycleEvent::Hangup,
        LifecycleEvent::Quit,
        LifecycleEvent::Kill,
        LifecycleEvent::Interrupt,
        LifecycleEvent::Terminate,
        LifecycleEvent::User1,
        LifecycleEvent::User2,
        LifecycleEvent::Fault,
    ];

    pub fn from_signal(signal: Signal) -> Self {
        match signal {
            Signal::Hangup => LifecycleEvent::Hangup,
            Signal::Interrupt => LifecycleEvent::Interrupt,
            Signal::Quit => LifecycleEvent::Quit,
            Signal::Kill => LifecycleEvent::Kill,
            Signal::Terminate => LifecycleEvent::Terminate,
            Signal::User1 => LifecycleEvent::User1,
            Signal::User2 => LifecycleEvent::User2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Exit => "exit",
            LifecycleEvent::Hangup => "SIGHUP",
            LifecycleEvent::Quit => "SIGQUIT",
            LifecycleEvent::Kill => "SIGKILL",
            LifecycleEvent::Interrupt => "SIGINT",
            LifecycleEvent::Terminate => "SIGTERM",
            LifecycleEvent::User1 => "SIGUSR1",
            LifecycleEvent::User2 => "SIGUSR2",
            LifecycleEvent::Fault => "fault",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
