//! Supervisor binary: restarts the responder executable on the reboot schedule, or (with the
//! `disable` argument) execs it once and never comes back.

use std::time::Duration;

use bls_scheduler::{next_reboot_delay, OVERLAP_SECONDS};
use bls_supervisor::{run_with_timeout, RunOutcome, SupervisorError};
use clap::Parser;
use eyre::WrapErr as _;

/// Extra seconds the global deadline alarm adds on top of the requested total runtime.
const GLOBAL_ALARM_SLACK_SECONDS: f64 = 10.0;
/// Timeout for the unconditional bootstrap run that lets the responder acquire its share
/// before any reboot-schedule timing starts.
const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
struct Cli {
    /// Either the literal `disable`, or five positional numbers: `n t attackTime rebootTime
    /// totalRuntime` (all times in seconds).
    #[clap(num_args = 1..=5)]
    args: Vec<String>,

    /// This node's 0-based index within the group, used to look up its place in the shared
    /// reboot permutation.
    #[clap(long, env = "NODE_INDEX")]
    node_index: usize,

    /// Path to the responder executable to supervise.
    #[clap(long, env = "RESPONDER_PATH", default_value = "responder")]
    responder_path: String,
}

enum Mode {
    Disabled,
    Scheduled {
        n: usize,
        t: usize,
        attack_time: f64,
        reboot_time: f64,
        total_runtime: f64,
    },
}

fn parse_mode(args: &[String]) -> Result<Mode, SupervisorError> {
    match args {
        [only] if only == "disable" => Ok(Mode::Disabled),
        [n, t, attack_time, reboot_time, total_runtime] => Ok(Mode::Scheduled {
            n: n.parse().map_err(|_| SupervisorError::BadUsage)?,
            t: t.parse().map_err(|_| SupervisorError::BadUsage)?,
            attack_time: parse_seconds(attack_time)?,
            reboot_time: parse_seconds(reboot_time)?,
            total_runtime: parse_seconds(total_runtime)?,
        }),
        _ => Err(SupervisorError::BadUsage),
    }
}

fn parse_seconds(value: &str) -> Result<f64, SupervisorError> {
    value
        .parse()
        .map_err(|source| SupervisorError::InvalidArgument {
            value: value.to_string(),
            source,
        })
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mode = parse_mode(&cli.args)?;

    match mode {
        Mode::Disabled => {
            tracing::info!(responder_path = %cli.responder_path, "reboot disabled, exec-ing responder directly");
            exec_responder(&cli.responder_path)
        }
        Mode::Scheduled {
            n,
            t,
            attack_time,
            reboot_time,
            total_runtime,
        } => {
            run_scheduled(
                &cli.responder_path,
                cli.node_index,
                n,
                t,
                attack_time,
                reboot_time,
                total_runtime,
            )
            .await
        }
    }
}

#[cfg(unix)]
fn exec_responder(path: &str) -> eyre::Result<()> {
    use std::os::unix::process::CommandExt as _;
    let error = std::process::Command::new(path).exec();
    Err(eyre::eyre!(error).wrap_err("failed to exec responder"))
}

#[cfg(not(unix))]
fn exec_responder(path: &str) -> eyre::Result<()> {
    Err(eyre::eyre!(
        "reboot-disabled exec mode requires a unix process model (path: {path})"
    ))
}

#[allow(clippy::too_many_arguments)]
async fn run_scheduled(
    responder_path: &str,
    node_index: usize,
    n: usize,
    t: usize,
    attack_time: f64,
    reboot_time: f64,
    total_runtime: f64,
) -> eyre::Result<()> {
    let global_alarm = tokio::time::sleep(Duration::from_secs_f64(
        total_runtime + GLOBAL_ALARM_SLACK_SECONDS,
    ));
    tokio::pin!(global_alarm);

    let schedule = async {
        tracing::info!("running unconditional bootstrap invocation");
        run_with_timeout(responder_path, &[], BOOTSTRAP_TIMEOUT)
            .await
            .wrap_err("bootstrap responder invocation failed")?;

        let mut r = 0usize;
        loop {
            let delay = next_reboot_delay(n, t, attack_time, reboot_time, node_index, r);
            let timeout = Duration::from_secs_f64((delay + OVERLAP_SECONDS).max(0.0));
            tracing::info!(r, delay, "spawning responder for this interval");

            match run_with_timeout(responder_path, &[], timeout)
                .await
                .wrap_err("responder invocation failed")?
            {
                RunOutcome::Exited(status) => {
                    tracing::info!(?status, "responder exited, scheduler stopping");
                    return Ok::<(), eyre::Report>(());
                }
                RunOutcome::TimedOut => {
                    let sleep_for = (reboot_time - OVERLAP_SECONDS).max(0.0);
                    tokio::time::sleep(Duration::from_secs_f64(sleep_for)).await;
                    r += 1;
                }
            }
        }
    };

    tokio::select! {
        result = schedule => result,
        _ = &mut global_alarm => {
            tracing::warn!("global deadline reached, stopping supervisor");
            Ok(())
        }
    }
}
