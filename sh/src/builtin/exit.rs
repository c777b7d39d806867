//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinResult, BuiltinUtility};
use crate::shell::Shell;

pub struct Exit;

impl BuiltinUtility for Exit {
    fn exec(&self, args: &[String], shell: &mut Shell) -> BuiltinResult {
        if args.len() > 1 {
            return Err("exit: too many arguments".into());
        }
        let status = match args.first() {
            Some(arg) => match arg.parse::<i32>() {
                Ok(status) => status,
                Err(_) => {
                    eprintln!("rush: exit: {}: numeric argument required", arg);
                    std::process::exit(2);
                }
            },
            None => shell.last_pipeline_exit_status,
        };
        std::process::exit(status);
    }
}
