//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::pattern::parse::{parse_pattern, PatternItem};
use crate::pattern::regex::{pattern_to_regex, Regex};
use crate::wordexp::expanded_word::ExpandedWord;
use std::ffi::CStr;

mod parse;
mod regex;

struct FilenamePatternPart {
    regex: Regex,
    starts_with_dot: bool,
}

/// A pathname pattern split into one matcher per `/`-separated component.
pub struct FilenamePattern {
    components: Vec<FilenamePatternPart>,
    pattern_string: String,
    has_wildcards: bool,
}

impl FilenamePattern {
    pub fn new(word: &ExpandedWord) -> Result<Self, String> {
        let pattern_string = word.to_string();
        let items = parse_pattern(word);
        let has_wildcards = items
            .iter()
            .any(|item| !matches!(item, PatternItem::Char(_)));
        let mut components = Vec::new();
        for component in items
            .split(|item| *item == PatternItem::Char('/'))
            .filter(|component| !component.is_empty())
        {
            components.push(FilenamePatternPart {
                starts_with_dot: component.first() == Some(&PatternItem::Char('.')),
                regex: pattern_to_regex(component)?,
            });
        }
        Ok(Self {
            components,
            pattern_string,
            has_wildcards,
        })
    }

    /// Whether the path component at `depth` (1-based) matches `name`.
    ///
    /// # Panics
    /// Panics if `depth` is zero or greater than `component_count`.
    pub fn matches_component(&self, depth: usize, name: &CStr) -> bool {
        assert!(
            depth > 0 && depth <= self.component_count(),
            "invalid depth"
        );
        let component = &self.components[depth - 1];
        if name.to_bytes().first() == Some(&b'.') && !component.starts_with_dot {
            // a leading dot is only matched by an explicit dot
            return false;
        }
        component.regex.matches(name)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_absolute(&self) -> bool {
        self.pattern_string.starts_with('/')
    }

    pub fn has_wildcards(&self) -> bool {
        self.has_wildcards
    }
}

impl From<FilenamePattern> for String {
    fn from(value: FilenamePattern) -> Self {
        value.pattern_string
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::ffi::CString;

    pub fn filename_pattern_from_str(pattern: &str) -> FilenamePattern {
        FilenamePattern::new(&ExpandedWord::unquoted_literal(pattern))
            .expect("failed to create filename pattern")
    }

    fn cstring(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn plain_components_match_in_order() {
        let pattern = filename_pattern_from_str("/path/to/file");
        assert!(pattern.is_absolute());
        assert_eq!(pattern.component_count(), 3);
        assert!(pattern.matches_component(1, &cstring("path")));
        assert!(pattern.matches_component(2, &cstring("to")));
        assert!(pattern.matches_component(3, &cstring("file")));
        assert!(!pattern.matches_component(3, &cstring("dir")));
    }

    #[test]
    fn wildcard_detection() {
        assert!(filename_pattern_from_str("*.txt").has_wildcards());
        assert!(filename_pattern_from_str("a?c").has_wildcards());
        assert!(filename_pattern_from_str("[ab]").has_wildcards());
        assert!(!filename_pattern_from_str("plain/name").has_wildcards());
    }

    #[test]
    fn quoted_wildcards_do_not_count() {
        let mut word = ExpandedWord::default();
        word.append("*.txt", true);
        assert!(!FilenamePattern::new(&word).unwrap().has_wildcards());
    }

    #[test]
    fn leading_dot_is_only_matched_explicitly() {
        let pattern = filename_pattern_from_str("*test");
        assert!(!pattern.matches_component(1, &cstring(".test")));
        assert!(pattern.matches_component(1, &cstring("atest")));

        let pattern = filename_pattern_from_str("/dir/*file");
        assert!(!pattern.matches_component(2, &cstring(".file")));

        let pattern = filename_pattern_from_str(".test");
        assert!(pattern.matches_component(1, &cstring(".test")));
    }

    #[test]
    fn bracket_expression_with_a_dot_does_not_match_hidden_files() {
        let pattern = filename_pattern_from_str("[.abc]*");
        assert!(!pattern.matches_component(1, &cstring(".a")));
    }
}
