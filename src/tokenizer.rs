//! Line classification.
//!
//! Turns physical lines into [`Token`]s, one per logical line. Recipe and
//! target lines ending in `\` are spliced with the lines that follow them;
//! blank lines and `#` comments are dropped. `##` lines are kept because
//! they may carry documentation.

use std::{iter::Enumerate, iter::FusedIterator, slice};

use crate::{ast::Token, Error, Result};

/// Lazy token stream over a borrowed slice of lines.
///
/// Build a new one for every pass; it is cheap and never shares state.
pub struct Tokenizer<'a, S> {
    lines: Enumerate<slice::Iter<'a, S>>,
    failed: bool,
}

pub fn tokenize<S: AsRef<str>>(lines: &[S]) -> Tokenizer<'_, S> {
    Tokenizer::new(lines)
}

impl<'a, S: AsRef<str>> Tokenizer<'a, S> {
    pub fn new(lines: &'a [S]) -> Self {
        Self {
            lines: lines.iter().enumerate(),
            failed: false,
        }
    }

    /// Joins `first` with its continuation lines, advancing the cursor past
    /// every line consumed.
    fn splice(&mut self, line: usize, first: &'a str) -> Result<String> {
        let mut pieces = Vec::new();
        let mut raw = first;
        let mut current = first.trim();
        let mut current_line = line;
        while current.ends_with('\\') {
            pieces.push(current.trim_end_matches('\\').trim());
            match self.lines.next() {
                Some((i, next)) => {
                    raw = next.as_ref();
                    current = raw.trim();
                    current_line = i + 1;
                }
                None => {
                    return Err(Error::MalformedContinuation {
                        line: current_line,
                        content: raw.to_string(),
                    })
                }
            }
        }
        pieces.push(current);
        pieces.retain(|p| !p.is_empty());
        Ok(pieces.join(" "))
    }
}

fn is_comment(raw: &str, trimmed: &str) -> bool {
    trimmed.starts_with('#') && !raw.starts_with("##")
}

impl<'a, S: AsRef<str>> Iterator for Tokenizer<'a, S> {
    type Item = Result<(usize, Token)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some((i, raw)) = self.lines.next() {
            let raw: &'a str = raw.as_ref();
            let line = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || is_comment(raw, trimmed) {
                continue;
            }

            let token = if raw.starts_with('\t') {
                self.splice(line, raw).map(Token::Command)
            } else if raw.contains(':') && !raw.contains('=') {
                self.splice(line, raw).map(Token::Target)
            } else {
                let text = raw.trim_matches(|c: char| c.is_whitespace() || c == ';');
                Ok(Token::Expression(text.to_string()))
            };

            return Some(match token {
                Ok(token) => {
                    tracing::trace!(line, ?token, "token");
                    Ok((line, token))
                }
                Err(err) => {
                    self.failed = true;
                    Err(err)
                }
            });
        }
        None
    }
}

impl<'a, S: AsRef<str>> FusedIterator for Tokenizer<'a, S> {}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::tokenize;
    use crate::{ast::Token, Error};

    fn tokens(input: &str) -> Vec<(usize, Token)> {
        let lines: Vec<&str> = input.lines().collect();
        tokenize(&lines)
            .collect::<Result<_, _>>()
            .unwrap_or_else(|e| panic!("input {:?} failed: {}", input, e))
    }

    #[test]
    fn test_classify() {
        use Token::*;
        let cases: Vec<(&str, Vec<(usize, Token)>)> = vec![
            ("", vec![]),
            ("   \n\t\n", vec![]),
            ("# comment", vec![]),
            ("  # indented comment", vec![]),
            ("\t# commented recipe", vec![]),
            ("  ## indented docs are comments", vec![]),
            ("all: build", vec![(1, Target("all: build".into()))]),
            ("\techo hi ", vec![(1, Command("echo hi".into()))]),
            ("CC = gcc;", vec![(1, Expression("CC = gcc".into()))]),
            ("X := y", vec![(1, Expression("X := y".into()))]),
            ("  export PATH ;\t", vec![(1, Expression("export PATH".into()))]),
            (
                "## help: show help",
                vec![(1, Target("## help: show help".into()))],
            ),
            (
                "# skip\nbuild: a\n\n\tmake a\nV=1",
                vec![
                    (2, Target("build: a".into())),
                    (4, Command("make a".into())),
                    (5, Expression("V=1".into())),
                ],
            ),
        ];

        for (i, (input, expected)) in cases.into_iter().enumerate() {
            assert_eq!(tokens(input), expected, "case {:02}, input: {:?}", i, input);
        }
    }

    #[test]
    fn test_continuation() {
        use Token::*;
        let cases: Vec<(&str, Vec<(usize, Token)>)> = vec![
            (
                "all: a \\\n  b \\\n  c\nnext: d",
                vec![(1, Target("all: a b c".into())), (4, Target("next: d".into()))],
            ),
            (
                "\tgcc -o x \\\n\t\t-O2 main.c",
                vec![(1, Command("gcc -o x -O2 main.c".into()))],
            ),
            (
                "all: a\\\\\n b",
                vec![(1, Target("all: a b".into()))],
            ),
            // a spliced-away line is never classified on its own
            (
                "all: a \\\n# not a comment: here\n\tcmd",
                vec![
                    (1, Target("all: a # not a comment: here".into())),
                    (3, Command("cmd".into())),
                ],
            ),
            (
                "all: a \\\n\nb: c",
                vec![(1, Target("all: a".into())), (3, Target("b: c".into()))],
            ),
            // expressions are not spliced
            (
                "X = a \\\nb: c",
                vec![(1, Expression("X = a \\".into())), (2, Target("b: c".into()))],
            ),
        ];

        for (i, (input, expected)) in cases.into_iter().enumerate() {
            assert_eq!(tokens(input), expected, "case {:02}, input: {:?}", i, input);
        }
    }

    #[test]
    fn test_continuation_at_eof() {
        let lines = ["all: a", "build: b \\", "\tcc \\"];
        let mut it = tokenize(&lines);
        assert!(matches!(it.next(), Some(Ok((1, Token::Target(_))))));
        match it.next() {
            Some(Err(Error::MalformedContinuation { line, content })) => {
                assert_eq!(line, 3);
                assert_eq!(content, "\tcc \\");
            }
            other => panic!("expected continuation error, got {:?}", other),
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn test_restartable() {
        let lines = vec!["a: b".to_string(), "\tc".to_string()];
        let first: Vec<_> = tokenize(&lines).map(Result::unwrap).collect();
        let second: Vec<_> = tokenize(&lines).map(Result::unwrap).collect();
        assert_eq!(first, second);
    }

    /// Line-by-line restatement of the classification rules: blanks and
    /// `#` comments vanish, recipe and target lines absorb their `\`
    /// continuations, everything else loses surrounding blanks and `;`.
    /// `None` when a continuation runs off the end.
    fn expected_texts(lines: &[String]) -> Option<Vec<String>> {
        let mut out = Vec::new();
        let mut rest = lines.iter();
        while let Some(raw) = rest.next() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || (trimmed.starts_with('#') && !raw.starts_with("##")) {
                continue;
            }
            if !(raw.starts_with('\t') || (raw.contains(':') && !raw.contains('='))) {
                out.push(raw.trim_matches(|c: char| c.is_whitespace() || c == ';').to_string());
                continue;
            }
            let mut pieces = vec![trimmed];
            while let Some(last) = pieces.pop() {
                if let Some(head) = last.strip_suffix('\\') {
                    pieces.push(head.trim_end_matches('\\').trim());
                    pieces.push(rest.next()?.trim());
                } else {
                    pieces.push(last);
                    break;
                }
            }
            pieces.retain(|p| !p.is_empty());
            out.push(pieces.join(" "));
        }
        Some(out)
    }

    proptest! {
        #[test]
        fn texts_match_line_rules(lines in prop::collection::vec(r"\t?[a-z :=#;\\]{0,12}", 0..20)) {
            let texts: Option<Vec<String>> = tokenize(&lines)
                .map(|t| t.map(|(_, token)| token.into_text()))
                .collect::<Result<_, _>>()
                .ok();
            prop_assert_eq!(texts, expected_texts(&lines));
        }

        #[test]
        fn spliced_target_joins_words(words in prop::collection::vec("[a-z]{1,6}", 1..8)) {
            let mut lines = vec![format!("t: {} \\", words[0])];
            for w in &words[1..] {
                lines.push(format!("  {} \\", w));
            }
            lines.push("  end".to_string());
            let tokens: Vec<_> = tokenize(&lines).map(Result::unwrap).collect();
            prop_assert_eq!(tokens.len(), 1);
            let expected = format!("t: {} end", words.join(" "));
            prop_assert_eq!(&tokens[0], &(1, Token::Target(expected)));
        }
    }
}
