//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use nix::sys::signal::Signal;
use std::ffi::CStr;

pub fn strcoll(lhs: &CStr, rhs: &CStr) -> std::cmp::Ordering {
    // both arguments are valid C strings, this is safe
    let ordering = unsafe { libc::strcoll(lhs.as_ptr(), rhs.as_ptr()) };
    ordering.cmp(&0)
}

/// Exit status reported for a child terminated by `signal`.
pub fn signal_exit_status(signal: Signal) -> i32 {
    128 + signal as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::ffi::CString;

    #[test]
    fn strcoll_orders_ascii_names() {
        let a = CString::new("a.txt").unwrap();
        let b = CString::new("b.txt").unwrap();
        assert_eq!(strcoll(&a, &b), Ordering::Less);
        assert_eq!(strcoll(&b, &a), Ordering::Greater);
        assert_eq!(strcoll(&a, &a), Ordering::Equal);
    }

    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        assert_eq!(signal_exit_status(Signal::SIGINT), 130);
        assert_eq!(signal_exit_status(Signal::SIGKILL), 137);
        assert_eq!(signal_exit_status(Signal::SIGTERM), 143);
    }
}
