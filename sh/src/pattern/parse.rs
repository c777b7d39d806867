//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::wordexp::expanded_word::{ExpandedWord, ExpandedWordPart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketItem {
    Char(char),
    Range(char, char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketExpression {
    pub items: Vec<BracketItem>,
    /// false for a `[!…]` expression, which matches the complement
    pub matching: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternItem {
    Char(char),
    QuestionMark,
    Asterisk,
    Bracket(BracketExpression),
}

/// Parses the pattern items of an expanded word. Quoted characters always
/// become literals; only unquoted `*`, `?` and `[` have pattern meaning.
pub fn parse_pattern(word: &ExpandedWord) -> Vec<PatternItem> {
    let chars: Vec<(char, bool)> = word
        .into_iter()
        .flat_map(|part| match part {
            ExpandedWordPart::UnquotedLiteral(s) => {
                s.chars().map(|c| (c, false)).collect::<Vec<_>>()
            }
            ExpandedWordPart::QuotedLiteral(s) => s.chars().map(|c| (c, true)).collect(),
        })
        .collect();

    let mut items = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (c, quoted) = chars[i];
        if quoted {
            items.push(PatternItem::Char(c));
            i += 1;
            continue;
        }
        match c {
            '?' => {
                items.push(PatternItem::QuestionMark);
                i += 1;
            }
            '*' => {
                items.push(PatternItem::Asterisk);
                i += 1;
            }
            '[' => match parse_bracket_expression(&chars, i + 1) {
                Some((expression, end)) => {
                    items.push(PatternItem::Bracket(expression));
                    i = end;
                }
                // an unterminated bracket expression is a literal `[`
                None => {
                    items.push(PatternItem::Char('['));
                    i += 1;
                }
            },
            c => {
                items.push(PatternItem::Char(c));
                i += 1;
            }
        }
    }
    items
}

fn parse_bracket_expression(
    chars: &[(char, bool)],
    mut i: usize,
) -> Option<(BracketExpression, usize)> {
    let mut matching = true;
    if matches!(chars.get(i), Some(('!', false))) {
        matching = false;
        i += 1;
    }
    let mut raw = Vec::new();
    // `]` in the first position is a member, not the terminator
    if matches!(chars.get(i), Some((']', _))) {
        raw.push(']');
        i += 1;
    }
    loop {
        match chars.get(i) {
            None => return None,
            Some((']', false)) => {
                i += 1;
                break;
            }
            Some((c, _)) => {
                raw.push(*c);
                i += 1;
            }
        }
    }
    if raw.is_empty() {
        return None;
    }

    // fold `a-b` into ranges; a `-` at either end is literal
    let mut items = Vec::new();
    let mut j = 0;
    while j < raw.len() {
        if j + 2 < raw.len() && raw[j + 1] == '-' {
            items.push(BracketItem::Range(raw[j], raw[j + 2]));
            j += 3;
        } else {
            items.push(BracketItem::Char(raw[j]));
            j += 1;
        }
    }
    Some((BracketExpression { items, matching }, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(pattern: &str) -> Vec<PatternItem> {
        parse_pattern(&ExpandedWord::unquoted_literal(pattern))
    }

    #[test]
    fn literal_text_parses_to_chars() {
        assert_eq!(
            parse_str("ab"),
            vec![PatternItem::Char('a'), PatternItem::Char('b')]
        );
    }

    #[test]
    fn wildcards_are_recognized() {
        assert_eq!(
            parse_str("a*?"),
            vec![
                PatternItem::Char('a'),
                PatternItem::Asterisk,
                PatternItem::QuestionMark
            ]
        );
    }

    #[test]
    fn quoted_wildcards_are_literal() {
        let mut word = ExpandedWord::unquoted_literal("a");
        word.append("*?", true);
        assert_eq!(
            parse_pattern(&word),
            vec![
                PatternItem::Char('a'),
                PatternItem::Char('*'),
                PatternItem::Char('?')
            ]
        );
    }

    #[test]
    fn bracket_expression_with_members_and_ranges() {
        assert_eq!(
            parse_str("[a-cz]"),
            vec![PatternItem::Bracket(BracketExpression {
                items: vec![BracketItem::Range('a', 'c'), BracketItem::Char('z')],
                matching: true,
            })]
        );
    }

    #[test]
    fn negated_bracket_expression() {
        assert_eq!(
            parse_str("[!ab]"),
            vec![PatternItem::Bracket(BracketExpression {
                items: vec![BracketItem::Char('a'), BracketItem::Char('b')],
                matching: false,
            })]
        );
    }

    #[test]
    fn closing_bracket_first_is_a_member() {
        assert_eq!(
            parse_str("[]a]"),
            vec![PatternItem::Bracket(BracketExpression {
                items: vec![BracketItem::Char(']'), BracketItem::Char('a')],
                matching: true,
            })]
        );
    }

    #[test]
    fn dash_at_the_edges_is_literal() {
        assert_eq!(
            parse_str("[-a]"),
            vec![PatternItem::Bracket(BracketExpression {
                items: vec![BracketItem::Char('-'), BracketItem::Char('a')],
                matching: true,
            })]
        );
        assert_eq!(
            parse_str("[a-]"),
            vec![PatternItem::Bracket(BracketExpression {
                items: vec![BracketItem::Char('a'), BracketItem::Char('-')],
                matching: true,
            })]
        );
    }

    #[test]
    fn unterminated_bracket_is_literal() {
        assert_eq!(
            parse_str("[ab"),
            vec![
                PatternItem::Char('['),
                PatternItem::Char('a'),
                PatternItem::Char('b')
            ]
        );
    }
}
