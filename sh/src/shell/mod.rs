//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{get_builtin_utility, BuiltinUtility};
use crate::jobs::{JobManager, JobState};
use crate::lexer::Parameter;
use crate::parser::{parse, CommandStage, PipelinePlan, RedirectionKind};
use crate::signals;
use crate::utils::signal_exit_status;
use crate::wordexp::{expand_word, expand_word_to_string};
use crate::shell::environment::{Environment, Value};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, fork, setpgid, tcsetpgrp, AccessFlags, ForkResult, Pid};
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStringExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;

pub mod environment;

pub const DEFAULT_PATH: &str = "/usr/bin:/bin";

fn find_in_path(command: &str, path_variable: &str) -> Option<PathBuf> {
    for directory in path_variable.split(':') {
        let mut command_path = PathBuf::from(directory);
        command_path.push(command);
        if unistd::access(&command_path, AccessFlags::X_OK).is_ok() {
            return Some(command_path);
        }
    }
    None
}

/// Resolves a command word to the program to execute. A word containing a
/// slash is used verbatim; anything else is searched for in `PATH`.
pub fn find_command(command: &str, path_variable: &str) -> Option<PathBuf> {
    if command.contains('/') {
        Some(PathBuf::from(command))
    } else {
        find_in_path(command, path_variable)
    }
}

/// How a foreground wait ended: every member reaped, or the pipeline was
/// stopped with the listed members still unreaped.
pub enum ForegroundWait {
    Completed(i32),
    Stopped(Vec<Pid>),
}

enum PipelineOutcome {
    Completed(i32),
    Stopped,
    Background,
}

/// A stage after expansion, ready to run in a child.
struct PreparedStage {
    argv: Vec<String>,
    assignments: Vec<(String, String)>,
    redirections: Vec<(RedirectionKind, String)>,
}

pub struct Shell {
    pub environment: Environment,
    pub jobs: JobManager,
    pub last_pipeline_exit_status: i32,
    pub last_background_pgid: Option<Pid>,
    pub shell_pid: Pid,
    pub shell_pgid: Pid,
    pub is_interactive: bool,
}

impl Shell {
    pub fn initialize_from_system(is_interactive: bool) -> Shell {
        // variables inherited from the environment start out exported
        let environment = Environment::from(
            std::env::vars().map(|(name, value)| (name, Value::new_exported(value))),
        );
        Shell {
            environment,
            jobs: JobManager::default(),
            last_pipeline_exit_status: 0,
            last_background_pgid: None,
            shell_pid: unistd::getpid(),
            shell_pgid: unistd::getpgrp(),
            is_interactive,
        }
    }

    /// Moves the shell into its own process group and makes that group the
    /// foreground group of the controlling terminal.
    pub fn claim_terminal(&mut self) {
        if setpgid(self.shell_pid, self.shell_pid).is_ok() {
            self.shell_pgid = self.shell_pid;
        } else {
            // already a process-group or session leader
            self.shell_pgid = unistd::getpgrp();
        }
        let _ = tcsetpgrp(io::stdin().as_fd(), self.shell_pgid);
    }

    pub fn parameter_value(&self, parameter: &Parameter) -> String {
        match parameter {
            Parameter::Variable(name) => self
                .environment
                .get_str_value(name)
                .unwrap_or_default()
                .to_string(),
            Parameter::ExitStatus => self.last_pipeline_exit_status.to_string(),
            Parameter::ShellPid => self.shell_pid.to_string(),
            Parameter::LastBackgroundPgid => self
                .last_background_pgid
                .map(|pgid| pgid.to_string())
                .unwrap_or_default(),
        }
    }

    /// Parses and runs one command line, recording its exit status in `$?`.
    pub fn execute_command_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match parse(line) {
            Ok(Some(plan)) => {
                self.last_pipeline_exit_status = self.execute_pipeline(&plan, line);
            }
            Ok(None) => {}
            Err(err) => {
                eprintln!("rush: {}", err);
                self.last_pipeline_exit_status = 2;
            }
        }
    }

    pub fn execute_pipeline(&mut self, plan: &PipelinePlan, command_text: &str) -> i32 {
        if plan.stages.is_empty() {
            return 0;
        }
        let negated = |status: i32| {
            if plan.negate {
                (status == 0) as i32
            } else {
                status
            }
        };

        // fast path: a single foreground stage that needs no redirections
        // and names a builtin (or nothing at all) runs in the shell process,
        // so that changes to the working directory, variables and jobs
        // persist
        if plan.stages.len() == 1 && !plan.background {
            let stage = &plan.stages[0];
            if stage.redirections.is_empty() {
                let prepared = self.prepare_stage(stage);
                if prepared.argv.is_empty() {
                    for (name, value) in prepared.assignments {
                        self.environment.set(name, value, false);
                    }
                    return negated(0);
                }
                if let Some(builtin) = get_builtin_utility(&prepared.argv[0]) {
                    // assignments are scoped to the stage: the builtin sees
                    // them, but the store keeps its prior values once the
                    // call returns
                    let saved_environment = (!prepared.assignments.is_empty())
                        .then(|| self.environment.clone());
                    for (name, value) in prepared.assignments {
                        self.environment.set(name, value, false);
                    }
                    let status = self.run_builtin(builtin, &prepared.argv[1..]);
                    if let Some(environment) = saved_environment {
                        self.environment = environment;
                    }
                    return negated(status);
                }
            }
        }

        match self.run_pipeline(plan, command_text) {
            PipelineOutcome::Completed(status) => negated(status),
            PipelineOutcome::Stopped | PipelineOutcome::Background => 0,
        }
    }

    fn run_builtin(&mut self, builtin: &dyn BuiltinUtility, args: &[String]) -> i32 {
        match builtin.exec(args, self) {
            Ok(status) => status,
            Err(err) => {
                eprintln!("rush: {}", err);
                1
            }
        }
    }

    fn prepare_stage(&self, stage: &CommandStage) -> PreparedStage {
        let mut argv = Vec::new();
        for word in &stage.words {
            argv.extend(expand_word(word, self));
        }
        let assignments = stage
            .assignments
            .iter()
            .map(|(name, value)| (name.clone(), expand_word_to_string(value, self)))
            .collect();
        let redirections = stage
            .redirections
            .iter()
            .map(|redirection| {
                (
                    redirection.kind,
                    expand_word_to_string(&redirection.target, self),
                )
            })
            .collect();
        PreparedStage {
            argv,
            assignments,
            redirections,
        }
    }

    fn run_pipeline(&mut self, plan: &PipelinePlan, command_text: &str) -> PipelineOutcome {
        let stages: Vec<PreparedStage> = plan
            .stages
            .iter()
            .map(|stage| self.prepare_stage(stage))
            .collect();
        let stage_count = stages.len();
        let foreground = !plan.background;

        let mut pipes = Vec::with_capacity(stage_count.saturating_sub(1));
        for _ in 1..stage_count {
            match unistd::pipe() {
                Ok(endpoints) => pipes.push(endpoints),
                Err(err) => {
                    eprintln!("rush: failed to create pipe ({})", err.desc());
                    std::process::exit(1);
                }
            }
        }

        let mut pgid = Pid::from_raw(0);
        let mut pids = Vec::with_capacity(stage_count);
        for (i, stage) in stages.iter().enumerate() {
            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    self.exec_stage(stage, i, stage_count, pgid, &pipes, foreground)
                }
                Ok(ForkResult::Parent { child }) => {
                    if i == 0 {
                        pgid = child;
                    }
                    // the child makes the same calls after fork; whichever
                    // side runs first establishes the group before the
                    // terminal can deliver a signal to it
                    let _ = setpgid(child, pgid);
                    if i == 0 && foreground && self.is_interactive {
                        let _ = tcsetpgrp(io::stdin().as_fd(), pgid);
                    }
                    pids.push(child);
                }
                Err(err) => {
                    eprintln!("rush: fork failed ({})", err.desc());
                    std::process::exit(1);
                }
            }
        }
        // both endpoints of every pipe are now held only by the children
        drop(pipes);

        if plan.background {
            self.last_background_pgid = Some(pgid);
            let number = self
                .jobs
                .add(pgid, pids, command_text.to_string(), JobState::Running);
            println!("[{}] {}", number, pgid);
            return PipelineOutcome::Background;
        }

        let outcome = match self.wait_for_foreground(&pids) {
            ForegroundWait::Completed(status) => PipelineOutcome::Completed(status),
            ForegroundWait::Stopped(remaining) => {
                self.jobs
                    .add(pgid, remaining, command_text.to_string(), JobState::Stopped);
                PipelineOutcome::Stopped
            }
        };
        if self.is_interactive {
            let _ = tcsetpgrp(io::stdin().as_fd(), self.shell_pgid);
        }
        outcome
    }

    /// Waits for every member of a foreground pipeline, in stage order. The
    /// last stage determines the status. Stops waiting as soon as a member
    /// reports a stop.
    pub fn wait_for_foreground(&mut self, pids: &[Pid]) -> ForegroundWait {
        let mut status = 0;
        for (i, pid) in pids.iter().enumerate() {
            let last = i == pids.len() - 1;
            loop {
                match waitpid(*pid, Some(WaitPidFlag::WUNTRACED)) {
                    Ok(WaitStatus::Exited(_, code)) => {
                        if last {
                            status = code;
                        }
                        break;
                    }
                    Ok(WaitStatus::Signaled(_, signal, _)) => {
                        if last {
                            status = signal_exit_status(signal);
                        }
                        break;
                    }
                    Ok(WaitStatus::Stopped(_, _)) => {
                        return ForegroundWait::Stopped(pids[i..].to_vec())
                    }
                    Ok(_) => {}
                    // reap errors other than "no children" are tolerated,
                    // and "no children" just means someone beat us to it
                    Err(_) => break,
                }
            }
        }
        ForegroundWait::Completed(status)
    }

    /// Child-side half of the pipeline launch. Never returns.
    fn exec_stage(
        &mut self,
        stage: &PreparedStage,
        index: usize,
        stage_count: usize,
        pgid: Pid,
        pipes: &[(OwnedFd, OwnedFd)],
        foreground: bool,
    ) -> ! {
        signals::restore_default_dispositions();

        let pgid = if index == 0 { unistd::getpid() } else { pgid };
        let _ = setpgid(Pid::from_raw(0), pgid);
        if index == 0 && foreground && self.is_interactive {
            let _ = tcsetpgrp(io::stdin().as_fd(), pgid);
        }

        if index > 0 {
            dup2_or_exit(pipes[index - 1].0.as_raw_fd(), libc::STDIN_FILENO);
        }
        if index < stage_count - 1 {
            dup2_or_exit(pipes[index].1.as_raw_fd(), libc::STDOUT_FILENO);
        }
        for (read_end, write_end) in pipes {
            let _ = unistd::close(read_end.as_raw_fd());
            let _ = unistd::close(write_end.as_raw_fd());
        }

        for (kind, target) in &stage.redirections {
            apply_redirection(*kind, target);
        }

        if stage.argv.is_empty() {
            // a redirection-only stage opens (and possibly creates) its
            // files, then does nothing
            std::process::exit(0);
        }

        for (name, value) in &stage.assignments {
            self.environment.set(name.clone(), value.clone(), true);
        }

        if let Some(builtin) = get_builtin_utility(&stage.argv[0]) {
            let status = self.run_builtin(builtin, &stage.argv[1..]);
            std::process::exit(status);
        }

        self.exec_external(&stage.argv)
    }

    fn exec_external(&self, argv: &[String]) -> ! {
        let path_variable = self
            .environment
            .get_str_value("PATH")
            .unwrap_or(DEFAULT_PATH);
        let Some(command_path) = find_command(&argv[0], path_variable) else {
            eprintln!("rush: {}: command not found", argv[0]);
            std::process::exit(127);
        };
        let Ok(command) = CString::new(command_path.into_os_string().into_vec()) else {
            eprintln!("rush: {}: invalid command path", argv[0]);
            std::process::exit(1);
        };
        let args: Vec<CString> = argv
            .iter()
            .filter_map(|arg| CString::new(arg.as_str()).ok())
            .collect();
        let env: Vec<CString> = self
            .environment
            .exported()
            .filter_map(|(name, value)| CString::new(format!("{}={}", name, value)).ok())
            .collect();
        // execve only returns on failure
        let err = unistd::execve(&command, &args, &env).unwrap_err();
        let status = match err {
            Errno::ENOENT => 127,
            Errno::EACCES | Errno::ENOEXEC => 126,
            _ => 1,
        };
        eprintln!("rush: {}: {}", argv[0], err.desc());
        std::process::exit(status);
    }
}

fn dup2_or_exit(old_fd: RawFd, new_fd: RawFd) {
    if let Err(err) = unistd::dup2(old_fd, new_fd) {
        eprintln!("rush: dup2 failed ({})", err.desc());
        std::process::exit(1);
    }
}

/// Opens a redirection target and installs it on the operator's file
/// descriptor. Runs in the child; an error terminates it with status 1.
fn apply_redirection(kind: RedirectionKind, target: &str) {
    let mut options = File::options();
    match kind {
        RedirectionKind::Input => options.read(true),
        RedirectionKind::Output => options.write(true).create(true).truncate(true).mode(0o644),
        RedirectionKind::Append => options.append(true).create(true).mode(0o644),
    };
    match options.open(target) {
        Ok(file) => {
            dup2_or_exit(file.as_raw_fd(), kind.target_fd());
            // dropping `file` closes the original descriptor
        }
        Err(err) => {
            eprintln!("rush: {}: {}", target, err);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_shell() -> Shell {
        let mut shell = Shell::initialize_from_system(false);
        shell.environment = Environment::default();
        shell
    }

    fn run_line(shell: &mut Shell, line: &str) {
        shell.execute_command_line(line);
    }

    #[test]
    fn find_command_uses_slash_words_verbatim() {
        assert_eq!(
            find_command("/bin/definitely-missing-thing", DEFAULT_PATH),
            Some(PathBuf::from("/bin/definitely-missing-thing"))
        );
        assert_eq!(
            find_command("./relative/path", DEFAULT_PATH),
            Some(PathBuf::from("./relative/path"))
        );
    }

    #[test]
    fn find_command_searches_the_path_in_order() {
        // `sh` exists in one of the default directories on any POSIX system
        let found = find_command("sh", DEFAULT_PATH).expect("sh not found");
        assert!(found.is_absolute());
        assert_eq!(
            find_command("definitely-not-a-command-1b2c", DEFAULT_PATH),
            None
        );
    }

    #[test]
    fn assignment_only_line_mutates_the_shell_store() {
        let mut shell = test_shell();
        run_line(&mut shell, "FOO=bar");
        assert_eq!(shell.environment.get_str_value("FOO"), Some("bar"));
        assert_eq!(shell.last_pipeline_exit_status, 0);
        // plain assignments are not exported
        assert_eq!(shell.environment.exported().count(), 0);
    }

    #[test]
    fn assignment_values_are_expanded() {
        let mut shell = test_shell();
        run_line(&mut shell, "A=xy");
        run_line(&mut shell, "B=$A-2");
        assert_eq!(shell.environment.get_str_value("B"), Some("xy-2"));
    }

    #[test]
    fn builtin_prefixed_assignments_do_not_persist() {
        let mut shell = test_shell();
        run_line(&mut shell, "FOO=bar jobs");
        assert_eq!(shell.environment.get_str_value("FOO"), None);
        assert_eq!(shell.last_pipeline_exit_status, 0);
    }

    #[test]
    fn export_builtin_marks_variables_for_children() {
        let mut shell = test_shell();
        run_line(&mut shell, "FOO=bar");
        run_line(&mut shell, "export FOO");
        let exported: Vec<_> = shell.environment.exported().collect();
        assert_eq!(exported, vec![("FOO", "bar")]);
    }

    #[test]
    fn parse_errors_set_status_2() {
        let mut shell = test_shell();
        run_line(&mut shell, "echo 'unterminated");
        assert_eq!(shell.last_pipeline_exit_status, 2);
    }

    #[test]
    fn empty_lines_leave_the_status_alone() {
        let mut shell = test_shell();
        shell.last_pipeline_exit_status = 7;
        run_line(&mut shell, "   ");
        assert_eq!(shell.last_pipeline_exit_status, 7);
    }

    #[test]
    fn special_parameters_come_from_shell_state() {
        let mut shell = test_shell();
        shell.last_pipeline_exit_status = 3;
        assert_eq!(shell.parameter_value(&Parameter::ExitStatus), "3");
        assert_eq!(
            shell.parameter_value(&Parameter::ShellPid),
            unistd::getpid().to_string()
        );
        assert_eq!(shell.parameter_value(&Parameter::LastBackgroundPgid), "");
        shell.last_background_pgid = Some(Pid::from_raw(4242));
        assert_eq!(shell.parameter_value(&Parameter::LastBackgroundPgid), "4242");
    }
}
