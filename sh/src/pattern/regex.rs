//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::pattern::parse::{BracketItem, PatternItem};
use std::ffi::{CStr, CString};
use std::ptr;

fn compilation_error(status: libc::c_int, regex: &libc::regex_t) -> String {
    let mut buffer = vec![0u8; 128];
    unsafe {
        libc::regerror(
            status,
            ptr::from_ref(regex),
            buffer.as_mut_ptr() as *mut libc::c_char,
            buffer.len(),
        )
    };
    CStr::from_bytes_until_nul(&buffer)
        .map(|message| message.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown regex error".to_string())
}

/// A compiled POSIX basic regular expression.
pub struct Regex {
    raw: libc::regex_t,
    regex_string: CString,
}

impl Regex {
    pub fn new(regex: CString) -> Result<Self, String> {
        let mut raw = unsafe { std::mem::zeroed::<libc::regex_t>() };
        let status = unsafe { libc::regcomp(ptr::from_mut(&mut raw), regex.as_ptr(), libc::REG_NOSUB) };
        if status != 0 {
            return Err(compilation_error(status, &raw));
        }
        Ok(Self {
            raw,
            regex_string: regex,
        })
    }

    pub fn matches(&self, string: &CStr) -> bool {
        let status = unsafe {
            libc::regexec(ptr::from_ref(&self.raw), string.as_ptr(), 0, ptr::null_mut(), 0)
        };
        status == 0
    }
}

impl Drop for Regex {
    fn drop(&mut self) {
        unsafe { libc::regfree(ptr::from_mut(&mut self.raw)) }
    }
}

impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Regex({:?})", self.regex_string)
    }
}

fn push_literal(regex: &mut String, c: char) {
    if matches!(c, '\\' | '.' | '[' | '*' | '^' | '$') {
        regex.push('\\');
    }
    regex.push(c);
}

fn push_bracket(regex: &mut String, items: &[BracketItem], matching: bool) {
    regex.push('[');
    if !matching {
        regex.push('^');
    }
    // inside a bracket expression `]` must come first, `^` must not come
    // first, and `-` must come last
    if items.contains(&BracketItem::Char(']')) {
        regex.push(']');
    }
    let mut has_dash = false;
    let mut has_caret = false;
    for item in items {
        match item {
            BracketItem::Char(']') => {}
            BracketItem::Char('-') => has_dash = true,
            BracketItem::Char('^') => has_caret = true,
            BracketItem::Char(c) => regex.push(*c),
            BracketItem::Range(start, end) => {
                regex.push(*start);
                regex.push('-');
                regex.push(*end);
            }
        }
    }
    if has_caret {
        regex.push('^');
    }
    if has_dash {
        regex.push('-');
    }
    regex.push(']');
}

/// Compiles a parsed pattern into an anchored regex, so that `matches`
/// reports whether the whole string matches the whole pattern.
pub fn pattern_to_regex(items: &[PatternItem]) -> Result<Regex, String> {
    let mut regex = String::from("^");
    for item in items {
        match item {
            PatternItem::Char(c) => push_literal(&mut regex, *c),
            PatternItem::QuestionMark => regex.push('.'),
            PatternItem::Asterisk => regex.push_str(".*"),
            PatternItem::Bracket(expression) => {
                push_bracket(&mut regex, &expression.items, expression.matching)
            }
        }
    }
    regex.push('$');
    let regex = CString::new(regex).map_err(|_| "pattern contains a null byte".to_string())?;
    Regex::new(regex)
}
