use std::{env, path::Path, process::Stdio};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::{debug, info};

use super::daemon_path::{daemon_exists, to_daemon_path};

/// Stops every other process running `name`. Returns how many were stopped.
pub fn kill_previous_servers(name: &Path) -> Result<usize> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't find own process id: {e}"))?;
    let mut killed = 0;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            debug!("Stopping process {pid}");
            // This will forcefully terminate the process on Windows. Anything better will require a
            // lot more work.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
            killed += 1;
        }
    }
    Ok(killed)
}

/// Stops the daemon binary as well as any `serve` started from this executable.
pub fn stop_servers() -> Result<usize> {
    let cli = env::current_exe()?;
    let mut killed = kill_previous_servers(&to_daemon_path(cli.clone()))?;
    killed += kill_previous_servers(&cli)?;
    Ok(killed)
}

/// Shuts down previous servers and starts a new one. The dedicated daemon binary detaches by
/// itself; without it the cli starts a detached `serve` of its own executable.
pub fn restart_server(dir: Option<&Path>) -> Result<()> {
    let cli = env::current_exe()?;
    let stopped = stop_servers()?;
    if stopped > 0 {
        info!("Stopped {stopped} previous instance(s)");
    }

    let mut command = if daemon_exists(&cli) {
        std::process::Command::new(to_daemon_path(cli))
    } else {
        let mut command = std::process::Command::new(cli);
        command.arg("serve");

        #[cfg(feature = "win")]
        {
            use std::os::windows::process::CommandExt;
            use windows::Win32::System::Threading::DETACHED_PROCESS;
            command.creation_flags(DETACHED_PROCESS.0);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command
    };
    if let Some(dir) = dir {
        command.arg("--dir").arg(dir);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());

    info!("Spawning {command:?}");
    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    Ok(())
}
