use std::process::Command;

use super::config::WekaConfig;
use super::WekaError;

/// Runs one toolkit invocation and returns its stdout.
pub trait ToolkitRunner {
    fn run(&self, args: &[String]) -> Result<String, WekaError>;
}

impl<T: ToolkitRunner + ?Sized> ToolkitRunner for &T {
    fn run(&self, args: &[String]) -> Result<String, WekaError> {
        (**self).run(args)
    }
}

/// Blocking `java -Xmx<N>G -cp <classpath> <args...>` subprocess.
#[derive(Debug, Clone)]
pub struct JavaRunner {
    config: WekaConfig,
}

impl JavaRunner {
    pub fn new(config: WekaConfig) -> Self {
        JavaRunner { config }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.config.java);
        cmd.args(self.config.jvm_args()).args(args);
        cmd
    }
}

impl ToolkitRunner for JavaRunner {
    fn run(&self, args: &[String]) -> Result<String, WekaError> {
        let mut cmd = self.command(args);
        log::debug!("Running {cmd:?}");

        let output = cmd.output().map_err(|source| WekaError::Spawn {
            program: self.config.java.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            log::error!("Weka stderr:\n{}", stderr.trim_end());
            return Err(WekaError::ProcessFailed {
                status: output.status.to_string(),
                stderr,
            });
        }
        if !stderr.trim().is_empty() {
            log::debug!("Weka stderr:\n{}", stderr.trim_end());
        }
        log::trace!("Weka stdout:\n{stdout}");
        Ok(stdout)
    }
}
