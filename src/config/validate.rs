// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use crate::config::model::{RawProcessDescriptor, RawProcessFile, RawSubCommand};
use crate::descriptor::{OtherOptions, ProcessDescriptor, SubCommand};
use crate::errors::{ProcessError, Result};
use crate::types::{ExecutionStrategy, ProcessType};

impl TryFrom<RawProcessDescriptor> for ProcessDescriptor {
    type Error = ProcessError;

    fn try_from(raw: RawProcessDescriptor) -> std::result::Result<Self, Self::Error> {
        let name = match raw.name {
            Some(ref n) if !n.trim().is_empty() => n.clone(),
            _ => {
                return Err(ProcessError::Configuration(
                    "process descriptor must have a non-empty `name`".to_string(),
                ));
            }
        };

        let kind = ProcessType::from_str(&raw.kind)
            .map_err(|e| ProcessError::Configuration(format!("process '{name}': {e}")))?;

        let execution_strategy = match raw.other.execution_strategy.as_deref() {
            Some(s) => ExecutionStrategy::from_str(s)
                .map_err(|e| ProcessError::Configuration(format!("process '{name}': {e}")))?,
            None => ExecutionStrategy::default(),
        };

        let mut cmds = BTreeMap::new();
        for (action, sub) in raw.cmds {
            let cmd = convert_sub_command(&name, &action, sub)?;
            cmds.insert(action, cmd);
        }

        let command = raw.other.command;
        if !command.is_empty() && !cmds.contains_key(&command) {
            return Err(ProcessError::Configuration(format!(
                "process '{name}' selects command '{command}' which is not in `cmds`"
            )));
        }

        let mut descriptor = ProcessDescriptor::new(name, kind, raw.exe);
        descriptor.cmds = cmds;
        descriptor.options = raw.options;
        descriptor.other = OtherOptions {
            paths: raw.other.paths,
            env: raw.other.env,
            set_process: raw.other.set_process,
            execution_strategy,
            command,
        };
        Ok(descriptor)
    }
}

fn convert_sub_command(name: &str, action: &str, raw: RawSubCommand) -> Result<SubCommand> {
    let args = match raw.args {
        None => Vec::new(),
        Some(toml::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                toml::Value::String(s) => Ok(s),
                other => Err(ProcessError::Configuration(format!(
                    "process '{name}' action '{action}': args must only contain strings (got {})",
                    other.type_str()
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(ProcessError::Configuration(format!(
                "process '{name}' action '{action}': args must be an array (got {})",
                other.type_str()
            )));
        }
    };

    Ok(SubCommand {
        exe: raw.exe.filter(|e| !e.is_empty()),
        usage: raw.usage,
        args,
    })
}

/// Convert every table of a descriptor file, naming unnamed tables after
/// their key and rejecting duplicate names.
pub fn validate_file(raw: RawProcessFile) -> Result<Vec<ProcessDescriptor>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.process.len());

    for (key, mut desc) in raw.process {
        if desc.name.is_none() {
            desc.name = Some(key.clone());
        }
        let descriptor = ProcessDescriptor::try_from(desc)?;
        if !seen.insert(descriptor.name.clone()) {
            return Err(ProcessError::Configuration(format!(
                "duplicate process name '{}' (table [process.{key}])",
                descriptor.name
            )));
        }
        out.push(descriptor);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<Vec<ProcessDescriptor>> {
        let raw: RawProcessFile = toml::from_str(src)?;
        validate_file(raw)
    }

    #[test]
    fn table_key_becomes_name() {
        let descriptors = parse(
            r#"
[process.php]
exe = "php-cgi"

[process.php.cmds.start]
args = ["-b", "127.0.0.1:9000"]
"#,
        )
        .unwrap();

        assert_eq!(descriptors.len(), 1);
        let php = &descriptors[0];
        assert_eq!(php.name, "php");
        assert_eq!(php.kind, ProcessType::Executable);
        assert_eq!(php.other.execution_strategy, ExecutionStrategy::Exec);
        assert_eq!(php.cmds["start"].args, vec!["-b", "127.0.0.1:9000"]);
        assert!(php.pid().is_none());
    }

    #[test]
    fn unknown_type_is_a_configuration_error() {
        let err = parse(
            r#"
[process.db]
type = "daemon"
"#,
        )
        .unwrap_err();

        match err {
            ProcessError::Configuration(msg) => assert!(msg.contains("daemon")),
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn non_array_args_are_rejected() {
        let err = parse(
            r#"
[process.py.cmds.start]
args = "main.py"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(ref m) if m.contains("must be an array")));
    }

    #[test]
    fn non_string_args_are_rejected() {
        let err = parse(
            r#"
[process.py.cmds.start]
args = ["main.py", 3]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(ref m) if m.contains("only contain strings")));
    }

    #[test]
    fn selected_command_must_exist() {
        let err = parse(
            r#"
[process.py.other]
command = "start"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(ref m) if m.contains("'start'")));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = parse(
            r#"
[process.a]
name = "same"

[process.b]
name = "same"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn missing_name_fails_direct_conversion() {
        let err = ProcessDescriptor::try_from(RawProcessDescriptor::default()).unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(_)));
    }
}
