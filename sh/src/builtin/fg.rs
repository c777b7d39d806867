//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinResult, BuiltinUtility};
use crate::jobs::JobState;
use crate::shell::{ForegroundWait, Shell};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::tcsetpgrp;
use std::io;
use std::os::fd::AsFd;

pub struct Fg;

impl BuiltinUtility for Fg {
    fn exec(&self, _args: &[String], shell: &mut Shell) -> BuiltinResult {
        shell.jobs.update();
        let (number, pgid, members, command) = {
            let Some(job) = shell
                .jobs
                .iter()
                .rev()
                .find(|job| !matches!(job.state, JobState::Done(_)))
            else {
                return Err("fg: no current job".into());
            };
            (job.number, job.pgid, job.members.clone(), job.command.clone())
        };

        println!("{}", command);
        // the job owns the terminal before it is woken, so a resumed reader
        // of the tty cannot be stopped again by SIGTTIN
        if shell.is_interactive {
            let _ = tcsetpgrp(io::stdin().as_fd(), pgid);
        }
        if let Err(err) = killpg(pgid, Signal::SIGCONT) {
            if shell.is_interactive {
                let _ = tcsetpgrp(io::stdin().as_fd(), shell.shell_pgid);
            }
            return Err(format!("fg: failed to resume job ({})", err.desc()).into());
        }
        if let Some(job) = shell.jobs.get_mut(number) {
            job.state = JobState::Running;
            job.state_should_be_reported = false;
        }

        let wait_result = shell.wait_for_foreground(&members);
        if shell.is_interactive {
            let _ = tcsetpgrp(io::stdin().as_fd(), shell.shell_pgid);
        }

        match wait_result {
            ForegroundWait::Completed(status) => {
                shell.jobs.remove(number);
                Ok(status)
            }
            ForegroundWait::Stopped(remaining) => {
                if let Some(job) = shell.jobs.get_mut(number) {
                    job.state = JobState::Stopped;
                    job.state_should_be_reported = true;
                    job.members = remaining;
                }
                Ok(0)
            }
        }
    }
}
