//! Spawns and times out the responder subprocess.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Command;

/// What happened to a supervised responder run.
#[derive(Debug)]
pub enum RunOutcome {
    /// The responder exited on its own, with the given status, before the timeout elapsed.
    Exited(ExitStatus),
    /// The responder was still running when the timeout elapsed and was killed.
    TimedOut,
}

/// Spawns `program` (with `args`) and waits up to `timeout` for it to exit. If it is still
/// running when `timeout` elapses, it is killed and [`RunOutcome::TimedOut`] is returned.
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> std::io::Result<RunOutcome> {
    let mut child = Command::new(program).args(args).spawn()?;

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => Ok(RunOutcome::Exited(status?)),
        Err(_elapsed) => {
            tracing::warn!(program, ?timeout, "responder timed out, killing");
            child.kill().await?;
            let _ = child.wait().await;
            Ok(RunOutcome::TimedOut)
        }
    }
}
