//! Process-backed migration executor
//!
//! Runs a project's migrate command as a child process, e.g.
//! `rustf-cli db migrate billing 0006 --verbosity 0 --database reporting`.

use super::{CommandOptions, MigrationExecutor, MigrationTarget};
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

/// Executor that shells out to a migrate command
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    base_args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandExecutor {
    /// Create an executor invoking `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append an argument placed before the `migrate` subcommand
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.base_args.push(arg.into());
        self
    }

    /// Run the command from `dir`
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Arguments for one apply call, excluding the program itself
    pub fn build_args(
        &self,
        app: &str,
        target: &MigrationTarget,
        options: &CommandOptions,
    ) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.push("migrate".to_string());
        args.push(app.to_string());
        if let Some(target) = target.as_arg() {
            args.push(target.to_string());
        }
        args.extend(options.to_args());
        args
    }
}

impl MigrationExecutor for CommandExecutor {
    fn apply(&self, app: &str, target: &MigrationTarget, options: &CommandOptions) -> Result<()> {
        let start_time = Instant::now();
        let args = self.build_args(app, target, options);
        let full_command = format!("{} {}", self.program, args.join(" "));

        log::debug!("Executing migrate command: {}", full_command);

        let mut cmd = Command::new(&self.program);
        cmd.args(&args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(Error::database_migration(format!(
                "'{}' failed (exit {}): {}",
                full_command,
                code,
                stderr.trim()
            )));
        }

        log::debug!(
            "Migrated {} to {} in {}ms",
            app,
            target,
            start_time.elapsed().as_millis()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_named_target() {
        let executor = CommandExecutor::new("rustf-cli").arg("db");
        let args = executor.build_args(
            "billing",
            &MigrationTarget::parse("0006"),
            &CommandOptions::new(Some("reporting".to_string())),
        );
        assert_eq!(
            args,
            vec!["db", "migrate", "billing", "0006", "--verbosity", "0", "--database", "reporting"]
        );
    }

    #[test]
    fn test_build_args_latest_omits_target() {
        let executor = CommandExecutor::new("rustf-cli");
        let args = executor.build_args("billing", &MigrationTarget::Latest, &CommandOptions::default());
        assert_eq!(args, vec!["migrate", "billing", "--verbosity", "0"]);

        let args = executor.build_args("billing", &MigrationTarget::Zero, &CommandOptions::default());
        assert_eq!(args[2], "zero");
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let executor = CommandExecutor::new("rustf-migrate-test-no-such-binary");
        let err = executor
            .apply("billing", &MigrationTarget::Latest, &CommandOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
