//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};

/// The signals a terminal aims at its foreground process group. The shell
/// ignores them while interactive: its own process group keeps them away in
/// the common case, but a just-forked child may not have left our group yet
/// when the terminal delivers one.
const JOB_CONTROL_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

static mut SIGNAL_WRITE: Option<RawFd> = None;
static mut SIGNAL_READ: Option<RawFd> = None;

extern "C" fn handle_sigchld(signal: libc::c_int) {
    // only async-signal-safe work happens here: one raw write to the
    // self-pipe; SIGNAL_WRITE is never modified after setup
    if let Some(fd) = unsafe { SIGNAL_WRITE } {
        let bytes = signal.to_ne_bytes();
        unsafe { libc::write(fd, bytes.as_ptr() as *const libc::c_void, bytes.len()) };
    }
}

fn set_pipe_flags(fd: RawFd) {
    unsafe {
        let status_flags = libc::fcntl(fd, libc::F_GETFL);
        libc::fcntl(fd, libc::F_SETFL, status_flags | libc::O_NONBLOCK);
        libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC);
    }
}

/// Installs the shell's signal dispositions and the self-pipe the SIGCHLD
/// handler reports through.
///
/// # Safety
/// Must be called once, while the process is still single-threaded.
pub unsafe fn setup_signal_handling(interactive: bool) {
    let (read_pipe, write_pipe) = nix::unistd::pipe().expect("failed to create the signal pipe");
    set_pipe_flags(read_pipe.as_raw_fd());
    set_pipe_flags(write_pipe.as_raw_fd());
    SIGNAL_READ = Some(read_pipe.into_raw_fd());
    SIGNAL_WRITE = Some(write_pipe.into_raw_fd());

    // SA_RESTART so the interactive read resumes transparently after a reap
    sigaction(
        Signal::SIGCHLD,
        &SigAction::new(
            SigHandler::Handler(handle_sigchld),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        ),
    )
    .expect("failed to install the SIGCHLD handler");

    if interactive {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        for signal in JOB_CONTROL_SIGNALS {
            sigaction(signal, &ignore).expect("failed to set signal disposition");
        }
    }
}

/// Empties the self-pipe. Returns whether any SIGCHLD arrived since the last
/// drain.
pub fn drain_pending_signals() -> bool {
    let Some(fd) = (unsafe { SIGNAL_READ }) else {
        return false;
    };
    let mut delivered = false;
    let mut buffer = [0u8; 64];
    loop {
        let read = unsafe {
            libc::read(fd, buffer.as_mut_ptr() as *mut libc::c_void, buffer.len())
        };
        // 0 is end-of-file, negative is EAGAIN: the pipe is empty
        if read <= 0 {
            break;
        }
        delivered = true;
    }
    delivered
}

/// Restores default dispositions in a forked child before it executes its
/// command. Ignore dispositions survive execve, so an inherited SIG_IGN
/// would leave the new program immune to terminal signals.
pub fn restore_default_dispositions() {
    let default_action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for signal in JOB_CONTROL_SIGNALS {
        let _ = unsafe { sigaction(signal, &default_action) };
    }
    let _ = unsafe { sigaction(Signal::SIGCHLD, &default_action) };
}
