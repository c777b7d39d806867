//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinResult, BuiltinUtility};
use crate::parser::is_valid_name;
use crate::shell::Shell;

pub struct Export;

impl BuiltinUtility for Export {
    fn exec(&self, args: &[String], shell: &mut Shell) -> BuiltinResult {
        if args.is_empty() {
            return Err("export: too few arguments".into());
        }
        for arg in args {
            match arg.split_once('=') {
                Some((name, value)) => {
                    if !is_valid_name(name) {
                        return Err(format!("export: '{}' is not a valid name", name).into());
                    }
                    shell
                        .environment
                        .set(name.to_string(), value.to_string(), true);
                }
                None => {
                    if !is_valid_name(arg) {
                        return Err(format!("export: '{}' is not a valid name", arg).into());
                    }
                    shell.environment.export(arg);
                }
            }
        }
        Ok(0)
    }
}
