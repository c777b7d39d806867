//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinResult, BuiltinUtility};
use crate::shell::Shell;

pub struct Jobs;

impl BuiltinUtility for Jobs {
    fn exec(&self, _args: &[String], shell: &mut Shell) -> BuiltinResult {
        shell.jobs.update();
        for job in shell.jobs.iter() {
            println!("{}", job.to_string_short());
        }
        // listing a job counts as reporting it
        shell.jobs.write_report(|_| {});
        shell.jobs.cleanup_terminated_jobs();
        Ok(0)
    }
}
