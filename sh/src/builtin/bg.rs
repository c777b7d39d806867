//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinResult, BuiltinUtility};
use crate::jobs::JobState;
use crate::shell::Shell;
use nix::sys::signal::{killpg, Signal};

pub struct Bg;

impl BuiltinUtility for Bg {
    fn exec(&self, _args: &[String], shell: &mut Shell) -> BuiltinResult {
        shell.jobs.update();
        let Some(job) = shell.jobs.last_stopped_mut() else {
            return Err("bg: no stopped jobs".into());
        };
        killpg(job.pgid, Signal::SIGCONT)
            .map_err(|err| format!("bg: failed to resume job ({})", err.desc()))?;
        job.state = JobState::Running;
        job.state_should_be_reported = false;
        Ok(0)
    }
}
