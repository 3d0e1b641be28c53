// src/resolver.rs

//! Turn a descriptor + action into a concrete invocation.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::descriptor::ProcessDescriptor;
use crate::errors::{ProcessError, Result};
use crate::types::ExecutionStrategy;

/// Everything an invoker needs to start one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Always empty after resolution; kept so callers can see what ran.
    pub usage: String,
    /// Fixed for the lifetime of this launch.
    pub strategy: ExecutionStrategy,
}

impl Invocation {
    pub fn program(&self) -> String {
        self.executable.display().to_string()
    }

    /// Space-joined command line, as handed to the shell.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:?}]", self.command_line(), self.strategy)
    }
}

/// Resolve `action` of `descriptor`.
///
/// Fails with [`ProcessError::Configuration`] when the action is not in
/// `cmds` or its `usage` is non-empty. The process type and the shape of
/// `args` were already checked when the descriptor was built.
pub fn resolve(descriptor: &ProcessDescriptor, action: &str) -> Result<Invocation> {
    let cmd = descriptor.cmds.get(action).ok_or_else(|| {
        ProcessError::Configuration(format!(
            "process '{}' has no action '{}'",
            descriptor.name, action
        ))
    })?;

    let exe = cmd
        .exe
        .as_deref()
        .filter(|e| !e.is_empty())
        .unwrap_or(&descriptor.exe);

    if exe.is_empty() {
        return Err(ProcessError::Configuration(format!(
            "process '{}' action '{}' has no executable",
            descriptor.name, action
        )));
    }

    if !cmd.usage.is_empty() {
        return Err(ProcessError::Configuration(format!(
            "process '{}' action '{}': usage must be empty (got '{}'); pass invocation text via args",
            descriptor.name, action, cmd.usage
        )));
    }

    let invocation = Invocation {
        executable: join_exe(&descriptor.other.paths.exe, exe),
        args: cmd.args.clone(),
        usage: String::new(),
        strategy: descriptor.other.execution_strategy,
    };

    debug!(name = %descriptor.name, action, invocation = %invocation, "resolved invocation");
    Ok(invocation)
}

/// Append `exe` under `base`, even when `exe` is itself absolute.
///
/// `Path::join` replaces the base on an absolute argument; here the root of
/// `exe` is dropped instead. An empty base leaves `exe` untouched.
fn join_exe(base: &Path, exe: &str) -> PathBuf {
    if base.as_os_str().is_empty() {
        return PathBuf::from(exe);
    }
    Path::new(exe)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .fold(base.to_path_buf(), |acc, c| acc.join(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SubCommand;
    use crate::types::ProcessType;

    fn php() -> ProcessDescriptor {
        let mut d = ProcessDescriptor::new("php", ProcessType::Executable, "php-cgi")
            .with_command("start", SubCommand::with_args(["-b", "127.0.0.1:9000"]))
            .with_strategy(ExecutionStrategy::Spawn);
        d.other.paths.exe = PathBuf::from("/usr/bin");
        d
    }

    #[test]
    fn joins_exe_path_and_copies_args() {
        let inv = resolve(&php(), "start").unwrap();
        assert_eq!(inv.executable, PathBuf::from("/usr/bin/php-cgi"));
        assert_eq!(inv.args, vec!["-b", "127.0.0.1:9000"]);
        assert_eq!(inv.strategy, ExecutionStrategy::Spawn);
        assert_eq!(inv.command_line(), "/usr/bin/php-cgi -b 127.0.0.1:9000");
    }

    #[test]
    fn sub_command_exe_overrides_descriptor_exe() {
        let mut cmd = SubCommand::with_args(["-v"]);
        cmd.exe = Some("php".to_string());
        let d = php().with_command("version", cmd);

        let inv = resolve(&d, "version").unwrap();
        assert_eq!(inv.executable, PathBuf::from("/usr/bin/php"));
    }

    #[test]
    fn absolute_override_stays_under_exe_path() {
        let mut cmd = SubCommand::with_args(["-v"]);
        cmd.exe = Some("/php-cgi".to_string());
        let mut d = php().with_command("version", cmd);
        d.other.paths.exe = PathBuf::from("/opt/php/bin");

        let inv = resolve(&d, "version").unwrap();
        assert_eq!(inv.executable, PathBuf::from("/opt/php/bin/php-cgi"));
    }

    #[test]
    fn absolute_exe_without_exe_path_is_kept() {
        let mut d = php();
        d.other.paths.exe = PathBuf::new();
        d.exe = "/usr/local/bin/php-cgi".to_string();
        let inv = resolve(&d, "start").unwrap();
        assert_eq!(inv.executable, PathBuf::from("/usr/local/bin/php-cgi"));
    }

    #[test]
    fn empty_paths_exe_leaves_bare_name() {
        let mut d = php();
        d.other.paths.exe = PathBuf::new();
        let inv = resolve(&d, "start").unwrap();
        assert_eq!(inv.executable, PathBuf::from("php-cgi"));
    }

    #[test]
    fn missing_action_is_a_configuration_error() {
        let err = resolve(&php(), "missingAction").unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(ref m) if m.contains("missingAction")));
    }

    #[test]
    fn non_empty_usage_is_rejected_even_when_otherwise_valid() {
        let mut cmd = SubCommand::with_args(["main.rs"]);
        cmd.usage = "build".to_string();
        let d = php().with_command("build", cmd);

        let err = resolve(&d, "build").unwrap_err();
        match err {
            ProcessError::Configuration(msg) => assert!(msg.contains("usage must be empty")),
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn missing_executable_is_rejected() {
        let d = ProcessDescriptor::new("nothing", ProcessType::File, "")
            .with_command("start", SubCommand::default());
        assert!(matches!(
            resolve(&d, "start"),
            Err(ProcessError::Configuration(_))
        ));
    }
}
