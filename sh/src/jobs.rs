//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::utils::signal_exit_status;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::fmt::{self, Display, Formatter, Write};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JobPosition {
    Current,
    Previous,
    Other,
}

impl Display for JobPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JobPosition::Current => f.write_char('+'),
            JobPosition::Previous => f.write_char('-'),
            JobPosition::Other => f.write_char(' '),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JobState {
    Running,
    Stopped,
    Done(i32),
}

impl Display for JobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => f.write_str("Running"),
            JobState::Stopped => f.write_str("Stopped"),
            JobState::Done(status) => {
                if *status == 0 {
                    f.write_str("Done")
                } else {
                    write!(f, "Done({})", status)
                }
            }
        }
    }
}

/// A pipeline launched as, or turned into, a job: one process group and the
/// member processes the shell still has to reap.
#[derive(Clone, Debug)]
pub struct Job {
    pub number: u64,
    pub pgid: Pid,
    /// unreaped members, in pipeline-stage order
    pub members: Vec<Pid>,
    pub state: JobState,
    pub command: String,
    pub position: JobPosition,
    pub state_should_be_reported: bool,
    last_member: Pid,
    last_member_status: i32,
}

impl Job {
    pub fn to_string_short(&self) -> String {
        format!(
            "[{}]{} {}    {}",
            self.number, self.position, self.state, self.command
        )
    }
}

#[derive(Clone, Debug)]
pub struct JobManager {
    jobs: Vec<Job>,
    next_job_number: u64,
}

impl JobManager {
    fn update_positions(&mut self) {
        for job in self.jobs.iter_mut().rev() {
            // `jobs` is ordered, so we only have to walk back until the
            // position is no longer `Current` or `Previous`
            if job.position == JobPosition::Other {
                break;
            }
            job.position = JobPosition::Other;
        }
        if let Some(job) = self.jobs.last_mut() {
            job.position = JobPosition::Current;
        }
        if self.jobs.len() > 1 {
            let len = self.jobs.len();
            self.jobs[len - 2].position = JobPosition::Previous;
        }
    }

    pub fn add(
        &mut self,
        pgid: Pid,
        members: Vec<Pid>,
        command: String,
        initial_state: JobState,
    ) -> u64 {
        let number = self.next_job_number;
        self.next_job_number += 1;
        let last_member = members.last().copied().unwrap_or(pgid);
        self.jobs.push(Job {
            number,
            pgid,
            members,
            state: initial_state,
            command,
            position: JobPosition::Current,
            state_should_be_reported: initial_state != JobState::Running,
            last_member,
            last_member_status: 0,
        });
        self.update_positions();
        number
    }

    /// Collects every state change currently available without blocking and
    /// applies it to the table. The final stage's status becomes the job
    /// status once every member has been reaped.
    pub fn update(&mut self) {
        for job in &mut self.jobs {
            if let JobState::Done(_) = job.state {
                continue;
            }
            let mut i = 0;
            while i < job.members.len() {
                let flags =
                    WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED;
                match waitpid(job.members[i], Some(flags)) {
                    Ok(WaitStatus::StillAlive) => i += 1,
                    Ok(WaitStatus::Exited(pid, status)) => {
                        if pid == job.last_member {
                            job.last_member_status = status;
                        }
                        job.members.remove(i);
                    }
                    Ok(WaitStatus::Signaled(pid, signal, _)) => {
                        if pid == job.last_member {
                            job.last_member_status = signal_exit_status(signal);
                        }
                        job.members.remove(i);
                    }
                    Ok(WaitStatus::Stopped(_, _)) => {
                        if job.state != JobState::Stopped {
                            job.state = JobState::Stopped;
                            job.state_should_be_reported = true;
                        }
                        i += 1;
                    }
                    Ok(WaitStatus::Continued(_)) => {
                        job.state = JobState::Running;
                        i += 1;
                    }
                    Ok(_) => i += 1,
                    // reap errors are tolerated; a child we cannot wait for
                    // is no longer ours to track
                    Err(_) => {
                        job.members.remove(i);
                    }
                }
            }
            if job.members.is_empty() {
                job.state = JobState::Done(job.last_member_status);
                job.state_should_be_reported = true;
            }
        }
    }

    /// Invokes `writer` for every job with an unreported state change, then
    /// marks everything reported.
    pub fn write_report<W: FnMut(&Job)>(&mut self, mut writer: W) {
        for job in self.jobs.iter_mut() {
            if job.state_should_be_reported {
                writer(job);
            }
            job.state_should_be_reported = false;
        }
    }

    pub fn cleanup_terminated_jobs(&mut self) {
        self.jobs.retain(|job| !matches!(job.state, JobState::Done(_)));
        self.update_positions();
    }

    pub fn last_stopped_mut(&mut self) -> Option<&mut Job> {
        self.jobs
            .iter_mut()
            .rev()
            .find(|job| job.state == JobState::Stopped)
    }

    pub fn get_mut(&mut self, number: u64) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.number == number)
    }

    pub fn remove(&mut self, number: u64) -> Option<Job> {
        let index = self.jobs.iter().position(|job| job.number == number)?;
        let job = self.jobs.remove(index);
        self.update_positions();
        Some(job)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            next_job_number: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_job(manager: &mut JobManager, pid: i32, command: &str, state: JobState) -> u64 {
        let pid = Pid::from_raw(pid);
        manager.add(pid, vec![pid], command.to_string(), state)
    }

    #[test]
    fn job_numbers_increase_from_one() {
        let mut manager = JobManager::default();
        assert_eq!(add_job(&mut manager, 100, "sleep 1 &", JobState::Running), 1);
        assert_eq!(add_job(&mut manager, 200, "sleep 2 &", JobState::Running), 2);
    }

    #[test]
    fn positions_track_the_two_most_recent_jobs() {
        let mut manager = JobManager::default();
        add_job(&mut manager, 100, "a", JobState::Running);
        add_job(&mut manager, 200, "b", JobState::Running);
        add_job(&mut manager, 300, "c", JobState::Running);
        let positions: Vec<_> = manager.iter().map(|job| job.position).collect();
        assert_eq!(
            positions,
            vec![
                JobPosition::Other,
                JobPosition::Previous,
                JobPosition::Current
            ]
        );

        manager.remove(3);
        let positions: Vec<_> = manager.iter().map(|job| job.position).collect();
        assert_eq!(positions, vec![JobPosition::Previous, JobPosition::Current]);
    }

    #[test]
    fn short_form_lists_number_position_state_and_command() {
        let mut manager = JobManager::default();
        add_job(&mut manager, 100, "sleep 1 &", JobState::Running);
        assert_eq!(
            manager.iter().last().unwrap().to_string_short(),
            "[1]+ Running    sleep 1 &"
        );
    }

    #[test]
    fn stopped_jobs_are_found_most_recent_first() {
        let mut manager = JobManager::default();
        add_job(&mut manager, 100, "a", JobState::Stopped);
        add_job(&mut manager, 200, "b", JobState::Running);
        add_job(&mut manager, 300, "c", JobState::Stopped);
        assert_eq!(manager.last_stopped_mut().unwrap().number, 3);
    }

    #[test]
    fn new_stopped_jobs_are_pending_a_report() {
        let mut manager = JobManager::default();
        add_job(&mut manager, 100, "a", JobState::Stopped);
        add_job(&mut manager, 200, "b", JobState::Running);
        let mut reported = Vec::new();
        manager.write_report(|job| reported.push(job.number));
        assert_eq!(reported, vec![1]);
        // a report is only emitted once
        let mut reported = Vec::new();
        manager.write_report(|job| reported.push(job.number));
        assert!(reported.is_empty());
    }

    #[test]
    fn done_jobs_are_dropped_by_cleanup() {
        let mut manager = JobManager::default();
        add_job(&mut manager, 100, "a", JobState::Running);
        manager.get_mut(1).unwrap().state = JobState::Done(0);
        manager.cleanup_terminated_jobs();
        assert!(manager.iter().next().is_none());
    }

    #[test]
    fn done_state_displays_nonzero_status() {
        assert_eq!(JobState::Done(0).to_string(), "Done");
        assert_eq!(JobState::Done(143).to_string(), "Done(143)");
    }
}
