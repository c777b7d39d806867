//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinResult, BuiltinUtility};
use crate::shell::Shell;
use std::path::Path;

pub struct Cd;

impl BuiltinUtility for Cd {
    fn exec(&self, args: &[String], shell: &mut Shell) -> BuiltinResult {
        if args.len() > 1 {
            return Err("cd: too many arguments".into());
        }
        let dir = match args.first() {
            Some(dir) => dir.as_str(),
            None => shell
                .environment
                .get_str_value("HOME")
                .ok_or("cd: HOME not set")?,
        };
        match nix::unistd::chdir(Path::new(dir)) {
            Ok(()) => Ok(0),
            Err(err) => Err(format!("cd: {}: {}", dir, err.desc()).into()),
        }
    }
}
