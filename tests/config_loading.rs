use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use procvisor::config::load_and_validate;
use procvisor::errors::ProcessError;
use procvisor::{ExecutionStrategy, ProcessType, StdioMode};

fn write_config(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{body}").unwrap();
    file
}

#[test]
fn test_full_descriptor_is_loaded() {
    let file = write_config(
        r#"
[process.php]
type = "service"
exe = "php-cgi"
options = { stdio = "null", shell = true }

[process.php.cmds.start]
args = ["-b", "127.0.0.1:9000"]

[process.php.cmds.stop]
exe = "pkill"
args = ["php-cgi"]

[process.php.other]
execution_strategy = "execFile"
paths = { exe = "/usr/bin", conf = "/etc/php" }
env = { PHP_FCGI_CHILDREN = "4" }
set_process = true
command = "start"
"#,
    );

    let descriptors = load_and_validate(file.path()).unwrap();
    assert_eq!(descriptors.len(), 1);
    let php = &descriptors[0];

    assert_eq!(php.name, "php");
    assert_eq!(php.kind, ProcessType::Service);
    assert_eq!(php.options.stdio, StdioMode::Null);
    assert!(php.options.shell);
    assert_eq!(php.cmds["start"].args, vec!["-b", "127.0.0.1:9000"]);
    assert_eq!(php.cmds["stop"].exe.as_deref(), Some("pkill"));
    assert_eq!(php.other.execution_strategy, ExecutionStrategy::ExecFile);
    assert_eq!(php.other.paths.exe, Path::new("/usr/bin"));
    assert_eq!(php.other.env["PHP_FCGI_CHILDREN"], "4");
    assert!(php.other.set_process);
    assert_eq!(php.other.command, "start");
    assert_eq!(php.pid(), None);
}

#[test]
fn test_invalid_type_returns_config_error() {
    let file = write_config(
        r#"
[process.bad]
type = "daemon"
exe = "x"
"#,
    );

    match load_and_validate(file.path()) {
        Err(ProcessError::Configuration(msg)) => {
            assert!(msg.contains("bad"));
            assert!(msg.contains("daemon"));
        }
        Err(e) => panic!("Expected Configuration error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_non_array_args_returns_config_error() {
    let file = write_config(
        r#"
[process.svc]
exe = "server"

[process.svc.cmds.start]
args = "--port 80"
"#,
    );

    match load_and_validate(file.path()) {
        Err(ProcessError::Configuration(msg)) => assert!(msg.contains("args must be an array")),
        other => panic!("Expected Configuration error, got: {:?}", other),
    }
}

#[test]
fn test_unknown_strategy_returns_config_error() {
    let file = write_config(
        r#"
[process.svc]
exe = "server"

[process.svc.other]
execution_strategy = "teleport"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(ProcessError::Configuration(_))
    ));
}

#[test]
fn test_malformed_toml_is_a_toml_error() {
    let file = write_config("[process.svc\nexe = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(ProcessError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("absent.toml")),
        Err(ProcessError::IoError(_))
    ));
}

#[test]
fn test_demo_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/procvisor.toml");
    let descriptors = load_and_validate(&path).unwrap();

    let names: Vec<&str> = descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["greeter", "sleeper", "ticker"]);

    let ticker = descriptors.iter().find(|d| d.name == "ticker").unwrap();
    assert_eq!(ticker.other.execution_strategy, ExecutionStrategy::Spawn);
    assert_eq!(ticker.other.env["TICKER"], "1");
}
