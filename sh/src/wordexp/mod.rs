//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::lexer::{Word, WordPart};
use crate::pattern::FilenamePattern;
use crate::shell::Shell;
use crate::wordexp::expanded_word::ExpandedWord;
use crate::wordexp::tilde::tilde_expansion;

pub mod expanded_word;
mod pathname;
mod tilde;

/// Tilde and parameter expansion. Never fails: an unresolvable tilde prefix
/// stays literal and an unset parameter expands to nothing.
fn simple_word_expansion(word: &Word, shell: &Shell) -> ExpandedWord {
    let mut word = word.clone();
    tilde_expansion(&mut word, &shell.environment);
    let mut result = ExpandedWord::default();
    for part in word.parts {
        match part {
            WordPart::UnquotedLiteral(literal) => result.append(literal, false),
            WordPart::QuotedLiteral(literal) => result.append(literal, true),
            WordPart::Parameter {
                parameter,
                inside_double_quotes,
            } => result.append(shell.parameter_value(&parameter), inside_double_quotes),
        }
    }
    result
}

/// Expansion for contexts that take exactly one string, such as redirection
/// targets and assignment values. No pathname expansion is performed.
pub fn expand_word_to_string(word: &Word, shell: &Shell) -> String {
    simple_word_expansion(word, shell).to_string()
}

/// Full expansion of an argument word into fields.
///
/// A word that expands to an empty string yields no field at all unless some
/// part of it was quoted. A pattern that matches no file is retained
/// unexpanded.
pub fn expand_word(word: &Word, shell: &Shell) -> Vec<String> {
    let expanded = simple_word_expansion(word, shell);
    if expanded.is_empty() {
        return if expanded.has_quoted_part() {
            vec![String::new()]
        } else {
            Vec::new()
        };
    }
    let pattern = match FilenamePattern::new(&expanded) {
        Ok(pattern) if pattern.has_wildcards() => pattern,
        // no wildcards, or a pattern the regex engine rejects: take the
        // text as it stands
        _ => return vec![expanded.to_string()],
    };
    let current_directory = match std::env::current_dir() {
        Ok(directory) => directory,
        Err(_) => return vec![expanded.to_string()],
    };
    let files = pathname::glob(&pattern, &current_directory);
    if files.is_empty() {
        vec![String::from(pattern)]
    } else {
        files
            .into_iter()
            .map(|file| file.to_string_lossy().into_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::test_utils::{quoted_word, unquoted_word};
    use crate::lexer::Parameter;
    use crate::shell::environment::{Environment, Value};

    fn test_shell(vars: &[(&str, &str)]) -> Shell {
        let mut shell = Shell::initialize_from_system(false);
        shell.environment = Environment::from(
            vars.iter()
                .map(|(name, value)| (name.to_string(), Value::new(value.to_string()))),
        );
        shell
    }

    fn parameter_word(parameter: Parameter, inside_double_quotes: bool) -> Word {
        Word {
            parts: vec![WordPart::Parameter {
                parameter,
                inside_double_quotes,
            }],
        }
    }

    #[test]
    fn single_quoted_text_is_never_expanded() {
        let shell = test_shell(&[("X", "value")]);
        assert_eq!(expand_word(&quoted_word("$X"), &shell), vec!["$X"]);
    }

    #[test]
    fn parameters_expand_to_their_value() {
        let shell = test_shell(&[("X", "value")]);
        let word = parameter_word(Parameter::Variable("X".to_string()), false);
        assert_eq!(expand_word(&word, &shell), vec!["value"]);
    }

    #[test]
    fn double_quoted_parameter_expands_to_its_value_or_nothing() {
        let shell = test_shell(&[("X", "value")]);
        let word = parameter_word(Parameter::Variable("X".to_string()), true);
        assert_eq!(expand_word(&word, &shell), vec!["value"]);

        let mut word = parameter_word(Parameter::Variable("UNSET".to_string()), true);
        word.parts.push(WordPart::QuotedLiteral(String::new()));
        assert_eq!(expand_word(&word, &shell), vec![""]);
    }

    #[test]
    fn unquoted_empty_expansion_yields_no_field() {
        let shell = test_shell(&[]);
        let word = parameter_word(Parameter::Variable("UNSET".to_string()), false);
        assert_eq!(expand_word(&word, &shell), Vec::<String>::new());
    }

    #[test]
    fn tilde_expands_to_home() {
        let shell = test_shell(&[("HOME", "/h")]);
        assert_eq!(expand_word(&unquoted_word("~"), &shell), vec!["/h"]);
        assert_eq!(
            expand_word(&unquoted_word("~/docs"), &shell),
            vec!["/h/docs"]
        );
    }

    #[test]
    fn exit_status_parameter() {
        let mut shell = test_shell(&[]);
        shell.last_pipeline_exit_status = 42;
        let word = parameter_word(Parameter::ExitStatus, false);
        assert_eq!(expand_word(&word, &shell), vec!["42"]);
    }

    #[test]
    fn last_background_pgid_is_empty_before_any_background_job() {
        let shell = test_shell(&[]);
        let word = parameter_word(Parameter::LastBackgroundPgid, false);
        assert_eq!(expand_word(&word, &shell), Vec::<String>::new());
    }

    #[test]
    fn words_mixing_literals_and_parameters_concatenate() {
        let shell = test_shell(&[("X", "abc")]);
        let word = Word {
            parts: vec![
                WordPart::Parameter {
                    parameter: Parameter::Variable("X".to_string()),
                    inside_double_quotes: false,
                },
                WordPart::UnquotedLiteral("def".to_string()),
            ],
        };
        assert_eq!(expand_word(&word, &shell), vec!["abcdef"]);
    }

    #[test]
    fn unmatched_pattern_is_retained() {
        let shell = test_shell(&[]);
        assert_eq!(
            expand_word(&unquoted_word("/nonexistent-dir-000/*.zzz"), &shell),
            vec!["/nonexistent-dir-000/*.zzz"]
        );
    }
}
