//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::lexer::{tokenize, Token, Word, WordPart};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    UnterminatedQuote,
    EmptyPipelineStage,
    MissingRedirectionTarget,
    BackgroundNotLast,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnterminatedQuote => f.write_str("unterminated quote"),
            ParseError::EmptyPipelineStage => f.write_str("syntax error near '|'"),
            ParseError::MissingRedirectionTarget => {
                f.write_str("missing file name after redirection operator")
            }
            ParseError::BackgroundNotLast => {
                f.write_str("'&' may only appear at the end of a pipeline")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectionKind {
    /// `<`
    Input,
    /// `>`
    Output,
    /// `>>`
    Append,
}

impl RedirectionKind {
    pub fn target_fd(&self) -> i32 {
        match self {
            RedirectionKind::Input => libc::STDIN_FILENO,
            RedirectionKind::Output | RedirectionKind::Append => libc::STDOUT_FILENO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub kind: RedirectionKind,
    pub target: Word,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandStage {
    pub assignments: Vec<(String, Word)>,
    pub words: Vec<Word>,
    pub redirections: Vec<Redirection>,
}

impl CommandStage {
    fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.words.is_empty() && self.redirections.is_empty()
    }

    fn has_command_or_redirection(&self) -> bool {
        !self.words.is_empty() || !self.redirections.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelinePlan {
    pub stages: Vec<CommandStage>,
    pub negate: bool,
    pub background: bool,
}

/// Where the parser stands inside the current stage. Assignments are only
/// recognized before the first ordinary word; redirections may appear
/// anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageState {
    InAssignments,
    InArguments,
}

pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Splits `NAME=value` into its name and value word. The value keeps the
/// quoting provenance of everything after the `=`.
fn split_assignment(word: &Word) -> Option<(String, Word)> {
    let Some(WordPart::UnquotedLiteral(first)) = word.parts.first() else {
        return None;
    };
    let eq = first.find('=')?;
    if !is_valid_name(&first[..eq]) {
        return None;
    }
    let name = first[..eq].to_string();
    let mut value = Word::default();
    if first.len() > eq + 1 {
        value
            .parts
            .push(WordPart::UnquotedLiteral(first[eq + 1..].to_string()));
    }
    value.parts.extend(word.parts[1..].iter().cloned());
    Some((name, value))
}

fn push_word(stage: &mut CommandStage, state: &mut StageState, word: Word) {
    if *state == StageState::InAssignments {
        if let Some((name, value)) = split_assignment(&word) {
            stage.assignments.push((name, value));
            return;
        }
        *state = StageState::InArguments;
    }
    stage.words.push(word);
}

fn literal_bang() -> Word {
    Word {
        parts: vec![WordPart::UnquotedLiteral("!".to_string())],
    }
}

/// Parses a command line into a pipeline plan. `Ok(None)` means the line held
/// nothing to execute.
pub fn parse(line: &str) -> Result<Option<PipelinePlan>, ParseError> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut plan = PipelinePlan::default();
    let mut stage = CommandStage::default();
    let mut state = StageState::InAssignments;
    let mut pending_redirection: Option<RedirectionKind> = None;

    let token_count = tokens.len();
    for (i, token) in tokens.into_iter().enumerate() {
        if let Some(kind) = pending_redirection.take() {
            match token {
                Token::Word(target) => {
                    stage.redirections.push(Redirection { kind, target });
                    continue;
                }
                _ => return Err(ParseError::MissingRedirectionTarget),
            }
        }
        match token {
            Token::Bang if i == 0 => plan.negate = true,
            // `!` is only special at the head of the pipeline
            Token::Bang => push_word(&mut stage, &mut state, literal_bang()),
            Token::Word(word) => push_word(&mut stage, &mut state, word),
            Token::Less => pending_redirection = Some(RedirectionKind::Input),
            Token::Great => pending_redirection = Some(RedirectionKind::Output),
            Token::DGreat => pending_redirection = Some(RedirectionKind::Append),
            Token::Pipe => {
                if !stage.has_command_or_redirection() {
                    return Err(ParseError::EmptyPipelineStage);
                }
                plan.stages.push(std::mem::take(&mut stage));
                state = StageState::InAssignments;
            }
            Token::And => {
                if i != token_count - 1 {
                    return Err(ParseError::BackgroundNotLast);
                }
                plan.background = true;
            }
        }
    }
    if pending_redirection.is_some() {
        return Err(ParseError::MissingRedirectionTarget);
    }

    if !plan.stages.is_empty() {
        // every stage of a multi-stage pipeline needs a command or redirection
        if !stage.has_command_or_redirection() {
            return Err(ParseError::EmptyPipelineStage);
        }
        plan.stages.push(stage);
    } else if !stage.is_empty() {
        // a lone stage may also consist of assignments only
        plan.stages.push(stage);
    }
    Ok(Some(plan))
}
