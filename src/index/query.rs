//! Free-text query grammar for details searches.
//!
//! The grammar is small and fixed: boolean keywords (`AND`, `OR`, `NOT`,
//! any case), parenthesized groups, `"quoted phrases"`, and `+`/`-`
//! love/hate term weighting. Adjacent terms combine with an implicit AND.
//!
//! The parser is lenient: an unclosed phrase runs to the end of the input,
//! unbalanced parentheses close at the end, and dangling operators are
//! dropped. A query is parsed per request and never persisted.

use std::fmt;

/// Weighting prefix of a single term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermWeight {
    Normal,
    /// `+term`: the term is required and weighted up.
    Love,
    /// `-term`: documents containing the term are excluded.
    Hate,
}

/// Abstract query produced by [`parse_query`].
#[derive(Debug, Clone, PartialEq)]
pub enum TextQuery {
    Term { text: String, weight: TermWeight },
    Phrase(Vec<String>),
    And(Vec<TextQuery>),
    Or(Vec<TextQuery>),
    Not(Box<TextQuery>),
}

impl fmt::Display for TextQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextQuery::Term { text, weight } => match weight {
                TermWeight::Normal => write!(f, "{}", text),
                TermWeight::Love => write!(f, "+{}", text),
                TermWeight::Hate => write!(f, "-{}", text),
            },
            TextQuery::Phrase(words) => write!(f, "\"{}\"", words.join(" ")),
            TextQuery::And(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", rendered.join(" AND "))
            }
            TextQuery::Or(parts) => {
                let rendered: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", rendered.join(" OR "))
            }
            TextQuery::Not(inner) => write!(f, "(NOT {})", inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Phrase(Vec<String>),
    Love(String),
    Hate(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

fn lex(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    phrase.push(c);
                }
                let words: Vec<String> = phrase
                    .split_whitespace()
                    .map(|w| w.to_lowercase())
                    .collect();
                if !words.is_empty() {
                    tokens.push(Token::Phrase(words));
                }
            }
            '+' | '-' => {
                chars.next();
                let word = take_word(&mut chars);
                if word.is_empty() {
                    continue;
                }
                if c == '+' {
                    tokens.push(Token::Love(word));
                } else {
                    tokens.push(Token::Hate(word));
                }
            }
            _ => {
                let word = take_word(&mut chars);
                if word.eq_ignore_ascii_case("and") {
                    tokens.push(Token::And);
                } else if word.eq_ignore_ascii_case("or") {
                    tokens.push(Token::Or);
                } else if word.eq_ignore_ascii_case("not") {
                    tokens.push(Token::Not);
                } else if !word.is_empty() {
                    tokens.push(Token::Word(word));
                }
            }
        }
    }
    tokens
}

fn take_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
            break;
        }
        word.push(c);
        chars.next();
    }
    word.to_lowercase()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // or := and (OR and)*
    fn parse_or(&mut self) -> Option<TextQuery> {
        let mut parts = Vec::new();
        if let Some(first) = self.parse_and() {
            parts.push(first);
        }
        while self.peek() == Some(&Token::Or) {
            self.next();
            if let Some(rhs) = self.parse_and() {
                parts.push(rhs);
            }
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(TextQuery::Or(parts)),
        }
    }

    // and := unary ((AND)? unary)*   (adjacency is an implicit AND)
    fn parse_and(&mut self) -> Option<TextQuery> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.next();
                }
                Some(Token::Or) | Some(Token::Close) | None => break,
                _ => {}
            }
            match self.parse_unary() {
                Some(part) => parts.push(part),
                None => break,
            }
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(TextQuery::And(parts)),
        }
    }

    // unary := NOT unary | primary
    fn parse_unary(&mut self) -> Option<TextQuery> {
        if self.peek() == Some(&Token::Not) {
            self.next();
            return self.parse_unary().map(|q| TextQuery::Not(Box::new(q)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<TextQuery> {
        match self.next()? {
            Token::Open => {
                let inner = self.parse_or();
                if self.peek() == Some(&Token::Close) {
                    self.next();
                }
                inner
            }
            Token::Word(text) => Some(TextQuery::Term {
                text,
                weight: TermWeight::Normal,
            }),
            Token::Love(text) => Some(TextQuery::Term {
                text,
                weight: TermWeight::Love,
            }),
            Token::Hate(text) => Some(TextQuery::Term {
                text,
                weight: TermWeight::Hate,
            }),
            Token::Phrase(words) => Some(TextQuery::Phrase(words)),
            // A stray close or dangling operator ends the current branch.
            Token::Close | Token::And | Token::Or | Token::Not => None,
        }
    }
}

/// Parse free query text into an abstract query. An empty or
/// operator-only input yields a query that matches nothing.
pub fn parse_query(input: &str) -> TextQuery {
    let mut parser = Parser {
        tokens: lex(input),
        pos: 0,
    };
    let mut query = parser.parse_or().unwrap_or(TextQuery::And(Vec::new()));
    // Leftover tokens after a stray close parenthesis join with implicit AND.
    while parser.peek().is_some() {
        parser.next();
        if let Some(rest) = parser.parse_or() {
            query = match query {
                TextQuery::And(parts) if parts.is_empty() => rest,
                q => TextQuery::And(vec![q, rest]),
            };
        }
    }
    query
}
