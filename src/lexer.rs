//! Tokenization of a committed command line.
//!
//! Splitting is whitespace-based with a single `in_quotes` flag that
//! toggles on either quote character. The two quote kinds are deliberately
//! not distinguished — opening with one and closing with the other still
//! toggles the flag. Quote characters remain part of the token; quoting is
//! structural only.

use std::fmt;

/// Upper bound on tokens per line; the tail beyond it is dropped with a
/// warning.
pub const MAX_TOKENS: usize = 64;

/// A trailing `> file` / `>> file` clause extracted from the token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectSpec {
    pub filename: String,
    pub append: bool,
}

impl fmt::Display for RedirectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            if self.append { ">>" } else { ">" },
            self.filename
        )
    }
}

/// Result of tokenizing one line: the argument tokens and, if the line
/// ended in a redirection clause, the extracted spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub tokens: Vec<String>,
    pub redirect: Option<RedirectSpec>,
}

/// Split `line` into owned tokens and extract a trailing redirection
/// clause.
///
/// Rules:
/// - Whitespace outside quotes ends the current token; inside quotes it is
///   ordinary content.
/// - At most [`MAX_TOKENS`] tokens are produced; the rest of the line is
///   discarded with a warning.
/// - If at least two tokens exist and the second-to-last is exactly `>` or
///   `>>`, that operator and the final token (the filename) are removed
///   from the argument list and returned as a [`RedirectSpec`]. A `>`
///   anywhere earlier in the line is an ordinary argument.
pub fn tokenize(line: &str) -> ParsedLine {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut truncated = false;

    for ch in line.chars() {
        if ch == '"' || ch == '\'' {
            in_quotes = !in_quotes;
        }
        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                if tokens.len() == MAX_TOKENS {
                    truncated = true;
                    break;
                }
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(ch);
    }
    if !current.is_empty() {
        if tokens.len() == MAX_TOKENS {
            truncated = true;
        } else {
            tokens.push(current);
        }
    }
    if truncated {
        log::warn!("maximum token limit reached ({}), line truncated", MAX_TOKENS);
    }

    let redirect = extract_redirect(&mut tokens);
    if let Some(ref spec) = redirect {
        log::debug!("output redirection: {}", spec);
    }
    ParsedLine { tokens, redirect }
}

/// Recognize `... <op> <filename>` as the final two tokens and strip them.
fn extract_redirect(tokens: &mut Vec<String>) -> Option<RedirectSpec> {
    if tokens.len() < 2 {
        return None;
    }
    let op_index = tokens.len() - 2;
    let append = match tokens[op_index].as_str() {
        ">" => false,
        ">>" => true,
        _ => return None,
    };
    let filename = tokens.pop().expect("length checked above");
    tokens.pop();
    Some(RedirectSpec { filename, append })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line).tokens
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(toks("echo hello world"), ["echo", "hello", "world"]);
    }

    #[test]
    fn collapses_repeated_whitespace() {
        assert_eq!(toks("  ls   -l  "), ["ls", "-l"]);
    }

    #[test]
    fn empty_line_has_no_tokens() {
        let parsed = tokenize("");
        assert!(parsed.tokens.is_empty());
        assert!(parsed.redirect.is_none());
    }

    #[test]
    fn quoted_space_stays_inside_token() {
        // Quote characters remain; toggling is structural only.
        assert_eq!(toks("set X=\"a b\" c"), ["set", "X=\"a b\"", "c"]);
    }

    #[test]
    fn single_quotes_behave_like_double_quotes() {
        assert_eq!(toks("echo 'a b'"), ["echo", "'a b'"]);
    }

    #[test]
    fn mixed_quote_kinds_still_toggle() {
        // Known looseness: opening with one kind and closing with the other
        // toggles the same flag.
        assert_eq!(toks("echo \"a b'"), ["echo", "\"a b'"]);
    }

    #[test]
    fn truncate_redirection_extracted() {
        let parsed = tokenize("ls docs > out.txt");
        assert_eq!(parsed.tokens, ["ls", "docs"]);
        assert_eq!(
            parsed.redirect,
            Some(RedirectSpec {
                filename: "out.txt".to_string(),
                append: false,
            })
        );
    }

    #[test]
    fn append_redirection_extracted() {
        let parsed = tokenize("ls docs >> out.txt");
        assert_eq!(parsed.tokens, ["ls", "docs"]);
        assert_eq!(
            parsed.redirect,
            Some(RedirectSpec {
                filename: "out.txt".to_string(),
                append: true,
            })
        );
    }

    #[test]
    fn early_redirect_operator_is_an_ordinary_argument() {
        let parsed = tokenize("echo > notfile word");
        assert_eq!(parsed.tokens, ["echo", ">", "notfile", "word"]);
        assert!(parsed.redirect.is_none());
    }

    #[test]
    fn bare_operator_without_filename_is_not_redirection() {
        let parsed = tokenize("ls >");
        // ">" is the last token, not the second-to-last: no clause.
        assert_eq!(parsed.tokens, ["ls", ">"]);
        assert!(parsed.redirect.is_none());
    }

    #[test]
    fn token_cap_drops_the_tail() {
        let line = (0..MAX_TOKENS + 10)
            .map(|i| format!("t{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let parsed = tokenize(&line);
        assert_eq!(parsed.tokens.len(), MAX_TOKENS);
        assert_eq!(parsed.tokens[0], "t0");
        assert_eq!(parsed.tokens[MAX_TOKENS - 1], format!("t{}", MAX_TOKENS - 1));
    }
}
