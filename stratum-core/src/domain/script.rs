//! SQL script parsing
//!
//! Migration and baseline scripts separate their statements with one or more
//! blank lines. A statement is every non-blank line between two separators,
//! joined with newlines:
//!
//! ```sql
//! CREATE TABLE users (
//!     id INTEGER
//! );
//!
//! -- comment-only blocks are skipped
//!
//! PRAGMA table_info('users');
//! ```
//!
//! Each statement is classified by its leading keyword. Statements that
//! change the database are executed, `PRAGMA` statements are run as queries
//! and their rows discarded. Anything else is rejected, and so is a block
//! holding more than one `;`-terminated command.

use super::result::{Error, Result};

/// Keywords of statements executed as writes
const EXEC_KEYWORDS: &[&str] = &["ALTER", "CREATE", "DELETE", "DROP", "INSERT", "UPDATE"];

/// Keywords of statements executed as reads
const QUERY_KEYWORDS: &[&str] = &["PRAGMA"];

const COMMENT_PREFIX: &str = "--";

/// How a statement is sent to the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Executed for its side effects
    Exec,
    /// Executed as a query, rows discarded
    Query,
}

/// A single classified statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
}

/// Raw script text plus the name used in diagnostics
#[derive(Debug, Clone)]
pub struct Script {
    name: String,
    text: String,
}

impl Script {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lazily iterate over the statements of this script.
    ///
    /// Every call starts again from the top of the script.
    pub fn statements(&self) -> Statements<'_> {
        Statements {
            script_name: &self.name,
            lines: self.text.lines(),
        }
    }

    /// Parse the whole script, failing on the first unrecognized statement.
    ///
    /// Nothing should be executed from a script until this has succeeded.
    pub fn parse(&self) -> Result<Vec<Statement>> {
        self.statements().collect()
    }
}

/// Iterator over the statements of a [`Script`]
pub struct Statements<'a> {
    script_name: &'a str,
    lines: std::str::Lines<'a>,
}

impl Statements<'_> {
    /// Next run of non-blank lines, trimmed
    fn next_block(&mut self) -> Option<String> {
        let mut block = String::new();
        for line in self.lines.by_ref() {
            if line.trim().is_empty() {
                if block.is_empty() {
                    continue;
                }
                break;
            }
            block.push_str(line);
            block.push('\n');
        }

        let block = block.trim();
        if block.is_empty() {
            None
        } else {
            Some(block.to_string())
        }
    }
}

impl Iterator for Statements<'_> {
    type Item = Result<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = self.next_block()?;

            // Comment-only block
            let Some(keyword) = leading_keyword(&block) else {
                continue;
            };

            let kind = if command_count(&block) > 1 {
                None
            } else if EXEC_KEYWORDS.contains(&keyword.as_str()) {
                Some(StatementKind::Exec)
            } else if QUERY_KEYWORDS.contains(&keyword.as_str()) {
                Some(StatementKind::Query)
            } else {
                None
            };
            let Some(kind) = kind else {
                return Some(Err(Error::UnrecognizedStatement {
                    script: self.script_name.to_string(),
                    statement: block,
                }));
            };

            return Some(Ok(Statement { kind, sql: block }));
        }
    }
}

/// Uppercased first word of the first non-comment line, or `None` if every
/// line is a comment
fn leading_keyword(statement: &str) -> Option<String> {
    let line = statement
        .lines()
        .map(str::trim)
        .find(|line| !line.starts_with(COMMENT_PREFIX))?;

    let keyword: String = line
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    Some(keyword.to_ascii_uppercase())
}

/// Number of non-empty `;`-separated commands, ignoring separators inside
/// quotes and comments
fn command_count(statement: &str) -> usize {
    let mut count = 0;
    let mut pending = false;
    let mut chars = statement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                pending = true;
                // A doubled quote closes and reopens, which nets out the same
                for next in chars.by_ref() {
                    if next == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ';' => {
                if pending {
                    count += 1;
                }
                pending = false;
            }
            c if !c.is_whitespace() => pending = true,
            _ => {}
        }
    }

    if pending {
        count += 1;
    }
    count
}
