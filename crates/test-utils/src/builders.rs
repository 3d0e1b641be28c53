#![allow(dead_code)]

use procvisor::{
    ExecutionStrategy, ProcessDescriptor, ProcessType, StdioMode, SubCommand,
};

/// Builder for `ProcessDescriptor` to simplify test setup.
pub struct DescriptorBuilder {
    descriptor: ProcessDescriptor,
}

impl DescriptorBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: ProcessDescriptor::new(name, ProcessType::Executable, ""),
        }
    }

    pub fn kind(mut self, kind: ProcessType) -> Self {
        self.descriptor.kind = kind;
        self
    }

    pub fn exe(mut self, exe: &str) -> Self {
        self.descriptor.exe = exe.to_string();
        self
    }

    pub fn action(mut self, name: &str, cmd: SubCommand) -> Self {
        self.descriptor.cmds.insert(name.to_string(), cmd);
        self
    }

    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.descriptor.other.execution_strategy = strategy;
        self
    }

    pub fn stdio(mut self, stdio: StdioMode) -> Self {
        self.descriptor.options.stdio = stdio;
        self
    }

    pub fn shell(mut self, val: bool) -> Self {
        self.descriptor.options.shell = val;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.descriptor
            .other
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_process(mut self, val: bool) -> Self {
        self.descriptor.other.set_process = val;
        self
    }

    pub fn build(self) -> ProcessDescriptor {
        self.descriptor
    }
}

/// Builder for `SubCommand`.
pub struct SubCommandBuilder {
    cmd: SubCommand,
}

impl SubCommandBuilder {
    pub fn new() -> Self {
        Self {
            cmd: SubCommand::default(),
        }
    }

    pub fn exe(mut self, exe: &str) -> Self {
        self.cmd.exe = Some(exe.to_string());
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.cmd.usage = usage.to_string();
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.cmd.args.push(arg.to_string());
        self
    }

    pub fn build(self) -> SubCommand {
        self.cmd
    }
}

impl Default for SubCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A descriptor whose `start` action runs `script` through `sh -c`
/// without relying on the shell-joining of the exec strategy.
pub fn sh_descriptor(name: &str, strategy: ExecutionStrategy, script: &str) -> ProcessDescriptor {
    DescriptorBuilder::new(name)
        .exe("sh")
        .strategy(strategy)
        .action("start", SubCommandBuilder::new().arg("-c").arg(script).build())
        .build()
}
