//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::cli::{parse_args, ExecutionMode};
use crate::shell::Shell;
use atty::Stream;
use std::io::{self, Write};

mod builtin;
mod cli;
mod jobs;
mod lexer;
mod parser;
mod pattern;
mod shell;
mod signals;
mod utils;
mod wordexp;

/// Reads one line from fd 0 byte by byte, never consuming input past the
/// newline. A child launched by this line can then read whatever follows it
/// on the same descriptor.
fn read_command_line(line: &mut String) -> io::Result<usize> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let read = unsafe {
            libc::read(
                libc::STDIN_FILENO,
                byte.as_mut_ptr() as *mut libc::c_void,
                1,
            )
        };
        match read {
            0 => break,
            1 => {
                bytes.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
        }
    }
    let count = bytes.len();
    line.push_str(&String::from_utf8_lossy(&bytes));
    Ok(count)
}

fn repl(shell: &mut Shell) {
    let mut line = String::new();
    loop {
        // deferred reaping: collect whatever the SIGCHLD handler queued and
        // report state changes before the next prompt
        signals::drain_pending_signals();
        shell.jobs.update();
        shell
            .jobs
            .write_report(|job| println!("{}", job.to_string_short()));
        shell.jobs.cleanup_terminated_jobs();

        if shell.is_interactive {
            let prompt = shell
                .environment
                .get_str_value("PS1")
                .unwrap_or("$ ")
                .to_string();
            print!("{}", prompt);
            let _ = io::stdout().flush();
        }

        line.clear();
        match read_command_line(&mut line) {
            Ok(0) => break,
            Ok(_) => shell.execute_command_line(&line),
            Err(_) => break,
        }
    }
    if shell.is_interactive {
        println!();
    }
}

fn main() {
    let is_attached_to_terminal = atty::is(Stream::Stdin) && atty::is(Stream::Stdout);
    let args = match parse_args(std::env::args().collect(), is_attached_to_terminal) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("rush: {}", err);
            std::process::exit(2);
        }
    };

    let is_interactive = matches!(args.execution_mode, ExecutionMode::Interactive);
    let mut shell = Shell::initialize_from_system(is_interactive);
    // the process is still single-threaded here
    unsafe { signals::setup_signal_handling(is_interactive) };
    if is_interactive {
        shell.claim_terminal();
    }

    match args.execution_mode {
        ExecutionMode::ReadCommandsFromString(commands) => {
            for line in commands.lines() {
                shell.execute_command_line(line);
            }
        }
        ExecutionMode::Interactive | ExecutionMode::ReadCommandsFromStdin => repl(&mut shell),
    }
    std::process::exit(shell.last_pipeline_exit_status);
}
