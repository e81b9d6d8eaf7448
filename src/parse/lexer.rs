use crate::common::{DbError, Result};

/// Reserved words of the SQL subset, lowercase.
pub const KEYWORDS: &[&str] = &[
    "select", "from", "where", "and", "insert", "into", "values", "delete", "update", "set",
    "create", "table", "int", "varchar", "view", "as", "index", "on",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Keyword(&'static str),
    /// Identifier, lowercased.
    Id(String),
    IntConst(i32),
    StrConst(String),
    Delim(char),
    Eof,
}

/// Splits SQL text into tokens. Keywords and identifiers are
/// case-insensitive; string literals keep their case and use `''` for an
/// embedded quote.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tokenizes the whole input. The last token is always `Token::Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next_token(&mut self) -> Result<Token> {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        let Some(ch) = self.peek() else {
            return Ok(Token::Eof);
        };

        if ch.is_ascii_alphabetic() || ch == '_' {
            let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            let word = word.to_ascii_lowercase();
            return Ok(match KEYWORDS.iter().find(|k| **k == word) {
                Some(keyword) => Token::Keyword(*keyword),
                None => Token::Id(word),
            });
        }

        if ch.is_ascii_digit() || ch == '-' {
            return self.lex_int();
        }

        if ch == '\'' {
            return self.lex_string();
        }

        self.pos += ch.len_utf8();
        match ch {
            '(' | ')' | ',' | '=' | '*' | ';' => Ok(Token::Delim(ch)),
            _ => Err(DbError::Parse(format!("unexpected character '{ch}'"))),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn lex_int(&mut self) -> Result<Token> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(DbError::Parse("'-' must be followed by digits".into()));
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(DbError::Parse(format!(
                "bad number starting at {:?}",
                &self.input[start..]
            )));
        }
        let text = &self.input[start..self.pos];
        text.parse::<i32>()
            .map(Token::IntConst)
            .map_err(|_| DbError::Parse(format!("integer {text} out of range")))
    }

    fn lex_string(&mut self) -> Result<Token> {
        self.pos += 1;
        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c != '\'' {
                value.push(c);
            } else if self.peek() == Some('\'') {
                value.push('\'');
                self.pos += 1;
            } else {
                return Ok(Token::StrConst(value));
            }
        }
        Err(DbError::Parse("unterminated string literal".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(sql: &str) -> Vec<Token> {
        Lexer::new(sql).tokenize().unwrap()
    }

    #[test]
    fn test_keywords_and_ids() {
        assert_eq!(
            lex("SELECT Name FROM Students"),
            vec![
                Token::Keyword("select"),
                Token::Id("name".into()),
                Token::Keyword("from"),
                Token::Id("students".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            lex("a = -12 and b='It''s'"),
            vec![
                Token::Id("a".into()),
                Token::Delim('='),
                Token::IntConst(-12),
                Token::Keyword("and"),
                Token::Id("b".into()),
                Token::Delim('='),
                Token::StrConst("It's".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("a > 3").tokenize().is_err());
        assert!(Lexer::new("99999999999").tokenize().is_err());
        assert!(Lexer::new("12abc").tokenize().is_err());
        assert!(Lexer::new("- 3").tokenize().is_err());
    }
}
