//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    Interactive,
    ReadCommandsFromStdin,
    ReadCommandsFromString(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub execution_mode: ExecutionMode,
}

pub fn parse_args(args: Vec<String>, is_attached_to_terminal: bool) -> Result<Args, String> {
    let mut execution_mode = None;
    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" => {
                let command_string = iter
                    .next()
                    .ok_or_else(|| "-c requires an argument".to_string())?;
                execution_mode = Some(ExecutionMode::ReadCommandsFromString(command_string));
            }
            "-s" => execution_mode = Some(ExecutionMode::ReadCommandsFromStdin),
            "-i" => execution_mode = Some(ExecutionMode::Interactive),
            other => return Err(format!("unknown option '{}'", other)),
        }
    }
    let execution_mode = execution_mode.unwrap_or(if is_attached_to_terminal {
        ExecutionMode::Interactive
    } else {
        ExecutionMode::ReadCommandsFromStdin
    });
    Ok(Args { execution_mode })
}
