// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::descriptor::{InvokeOptions, Paths};

/// Top-level descriptor file as read from TOML.
///
/// ```toml
/// [process.php]
/// type = "executable"
/// exe = "php-cgi"
///
/// [process.php.cmds.start]
/// args = ["-b", "127.0.0.1:9000"]
///
/// [process.php.other]
/// execution_strategy = "spawn"
/// paths = { exe = "/usr/bin" }
/// ```
///
/// Table keys are descriptor names unless a table sets `name` itself.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProcessFile {
    #[serde(default)]
    pub process: BTreeMap<String, RawProcessDescriptor>,
}

/// A descriptor before validation.
///
/// String-typed where the value is checked by hand (`type`,
/// `execution_strategy`, `args`) so that a bad value surfaces as a
/// configuration error naming the offending descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProcessDescriptor {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub exe: String,

    #[serde(default)]
    pub cmds: BTreeMap<String, RawSubCommand>,

    #[serde(default)]
    pub options: InvokeOptions,

    #[serde(default)]
    pub other: RawOtherOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubCommand {
    #[serde(default)]
    pub exe: Option<String>,

    #[serde(default)]
    pub usage: String,

    /// Expected to be an array of strings; anything else is rejected.
    #[serde(default)]
    pub args: Option<toml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOtherOptions {
    #[serde(default)]
    pub paths: Paths,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub set_process: bool,

    #[serde(default)]
    pub execution_strategy: Option<String>,

    #[serde(default)]
    pub command: String,
}

fn default_kind() -> String {
    "executable".to_string()
}
