//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::lexer::{Word, WordPart};
use crate::shell::environment::Environment;
use nix::unistd::{getuid, User};

trait UsersHomeDirs {
    fn own_home(&self) -> Option<String>;
    fn user_home(&self, login_name: &str) -> Option<String>;
}

struct DefaultUsersHomeDirs;

impl UsersHomeDirs for DefaultUsersHomeDirs {
    fn own_home(&self) -> Option<String> {
        User::from_uid(getuid())
            .ok()
            .flatten()
            .map(|user| user.dir.to_string_lossy().into_owned())
    }

    fn user_home(&self, login_name: &str) -> Option<String> {
        User::from_name(login_name)
            .ok()
            .flatten()
            .map(|user| user.dir.to_string_lossy().into_owned())
    }
}

fn expand_home(
    login_name: &str,
    env: &Environment,
    home_dirs: &dyn UsersHomeDirs,
) -> Option<String> {
    if login_name.is_empty() {
        env.get_str_value("HOME")
            .map(str::to_string)
            .or_else(|| home_dirs.own_home())
    } else {
        home_dirs.user_home(login_name)
    }
}

fn tilde_expansion_with_home_dirs(
    word: &mut Word,
    env: &Environment,
    home_dirs: &dyn UsersHomeDirs,
) {
    let (login_name, suffix) = {
        let Some(WordPart::UnquotedLiteral(first)) = word.parts.first() else {
            return;
        };
        let Some(rest) = first.strip_prefix('~') else {
            return;
        };
        match rest.find('/') {
            Some(end) => (rest[..end].to_string(), rest[end..].to_string()),
            // without a slash the prefix must reach the end of the word
            None if word.parts.len() == 1 => (rest.to_string(), String::new()),
            None => return,
        }
    };
    // a prefix that cannot be resolved is left alone
    let Some(home) = expand_home(&login_name, env, home_dirs) else {
        return;
    };
    // the home directory is treated as quoted so it is never matched as a
    // pattern
    word.parts[0] = WordPart::QuotedLiteral(home);
    if !suffix.is_empty() {
        word.parts
            .insert(1, WordPart::UnquotedLiteral(suffix));
    }
}

pub fn tilde_expansion(word: &mut Word, env: &Environment) {
    tilde_expansion_with_home_dirs(word, env, &DefaultUsersHomeDirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::test_utils::{quoted_word, unquoted_word};
    use crate::shell::environment::Value;
    use std::collections::HashMap;

    #[derive(Default)]
    struct TestUsersHomeDirs {
        own_home: Option<String>,
        users_home_dirs: HashMap<String, String>,
    }

    impl UsersHomeDirs for TestUsersHomeDirs {
        fn own_home(&self) -> Option<String> {
            self.own_home.clone()
        }

        fn user_home(&self, login_name: &str) -> Option<String> {
            self.users_home_dirs.get(login_name).cloned()
        }
    }

    fn expand(word_str: &str, env_home: Option<&str>, home_dirs: &TestUsersHomeDirs) -> Word {
        let env = match env_home {
            Some(home) => Environment::from([("HOME".to_string(), Value::new(home.to_string()))]),
            None => Environment::default(),
        };
        let mut word = unquoted_word(word_str);
        tilde_expansion_with_home_dirs(&mut word, &env, home_dirs);
        word
    }

    #[test]
    fn bare_tilde_expands_to_home() {
        assert_eq!(
            expand("~", Some("/h"), &TestUsersHomeDirs::default()),
            quoted_word("/h")
        );
    }

    #[test]
    fn tilde_with_a_path_keeps_the_remainder_unquoted() {
        assert_eq!(
            expand("~/docs", Some("/h"), &TestUsersHomeDirs::default()),
            Word {
                parts: vec![
                    WordPart::QuotedLiteral("/h".to_string()),
                    WordPart::UnquotedLiteral("/docs".to_string()),
                ]
            }
        );
    }

    #[test]
    fn named_user_comes_from_the_user_database() {
        let home_dirs = TestUsersHomeDirs {
            users_home_dirs: [("alice".to_string(), "/home/alice".to_string())].into(),
            ..Default::default()
        };
        assert_eq!(
            expand("~alice", Some("/h"), &home_dirs),
            quoted_word("/home/alice")
        );
        assert_eq!(
            expand("~alice/x", Some("/h"), &home_dirs),
            Word {
                parts: vec![
                    WordPart::QuotedLiteral("/home/alice".to_string()),
                    WordPart::UnquotedLiteral("/x".to_string()),
                ]
            }
        );
    }

    #[test]
    fn unset_home_falls_back_to_the_user_database() {
        let home_dirs = TestUsersHomeDirs {
            own_home: Some("/pw/home".to_string()),
            ..Default::default()
        };
        assert_eq!(expand("~", None, &home_dirs), quoted_word("/pw/home"));
    }

    #[test]
    fn unresolvable_tilde_stays_literal() {
        assert_eq!(
            expand("~nobody99", Some("/h"), &TestUsersHomeDirs::default()),
            unquoted_word("~nobody99")
        );
        assert_eq!(
            expand("~", None, &TestUsersHomeDirs::default()),
            unquoted_word("~")
        );
    }

    #[test]
    fn quoted_tilde_is_not_expanded() {
        let env = Environment::from([("HOME".to_string(), Value::new("/h".to_string()))]);
        let mut word = quoted_word("~");
        tilde_expansion_with_home_dirs(&mut word, &env, &TestUsersHomeDirs::default());
        assert_eq!(word, quoted_word("~"));
    }

    #[test]
    fn tilde_in_the_middle_of_a_word_is_literal() {
        assert_eq!(
            expand("a~b", Some("/h"), &TestUsersHomeDirs::default()),
            unquoted_word("a~b")
        );
    }
}
