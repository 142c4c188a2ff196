//! Tokenizer for rule fragments.

use std::fmt;

use super::error::RuleError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Name(String),
    True,
    False,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Assign,
    PlusAssign,
    MinusAssign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Name(name) => write!(f, "`{name}`"),
            Self::True => f.write_str("`True`"),
            Self::False => f.write_str("`False`"),
            Self::And => f.write_str("`and`"),
            Self::Or => f.write_str("`or`"),
            Self::Not => f.write_str("`not`"),
            Self::Plus => f.write_str("`+`"),
            Self::Minus => f.write_str("`-`"),
            Self::Star => f.write_str("`*`"),
            Self::Slash => f.write_str("`/`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::LBracket => f.write_str("`[`"),
            Self::RBracket => f.write_str("`]`"),
            Self::Comma => f.write_str("`,`"),
            Self::Semicolon => f.write_str("`;`"),
            Self::Assign => f.write_str("`=`"),
            Self::PlusAssign => f.write_str("`+=`"),
            Self::MinusAssign => f.write_str("`-=`"),
            Self::Eq => f.write_str("`==`"),
            Self::Ne => f.write_str("`!=`"),
            Self::Lt => f.write_str("`<`"),
            Self::Le => f.write_str("`<=`"),
            Self::Gt => f.write_str("`>`"),
            Self::Ge => f.write_str("`>=`"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek().filter(|&c| pred(c)) {
            out.push(c);
            self.bump();
        }
    }
}

/// Splits `src` into tokens, always terminated by [`Token::Eof`].
///
/// # Errors
///
/// Returns [`RuleError::Syntax`] on characters outside the rule alphabet
/// (quotes, dots outside numbers, `@`, ...) and on malformed numbers.
pub(crate) fn tokenize(src: &str) -> Result<Vec<Spanned>, RuleError> {
    let mut cur = Cursor {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();

    loop {
        while cur.peek().is_some_and(char::is_whitespace) {
            cur.bump();
        }
        if cur.peek() == Some('#') {
            while cur.peek().is_some_and(|c| c != '\n') {
                cur.bump();
            }
            continue;
        }

        let (line, column) = (cur.line, cur.column);
        let Some(c) = cur.peek() else {
            tokens.push(Spanned {
                token: Token::Eof,
                line,
                column,
            });
            return Ok(tokens);
        };

        let token = if c.is_ascii_digit() || (c == '.' && cur.peek_next().is_some_and(|n| n.is_ascii_digit())) {
            lex_number(&mut cur, line, column)?
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            cur.take_while(&mut word, |c| c.is_ascii_alphanumeric() || c == '_');
            match word.as_str() {
                "True" => Token::True,
                "False" => Token::False,
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                _ => Token::Name(word),
            }
        } else {
            cur.bump();
            match c {
                '+' if cur.eat('=') => Token::PlusAssign,
                '-' if cur.eat('=') => Token::MinusAssign,
                '=' if cur.eat('=') => Token::Eq,
                '!' if cur.eat('=') => Token::Ne,
                '<' if cur.eat('=') => Token::Le,
                '>' if cur.eat('=') => Token::Ge,
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' if cur.peek() == Some('*') => {
                    return Err(RuleError::syntax(line, column, "operator `**` is not supported"));
                }
                '*' => Token::Star,
                '/' if cur.peek() == Some('/') => {
                    return Err(RuleError::syntax(line, column, "operator `//` is not supported"));
                }
                '/' => Token::Slash,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '=' => Token::Assign,
                '<' => Token::Lt,
                '>' => Token::Gt,
                other => {
                    return Err(RuleError::syntax(
                        line,
                        column,
                        format!("unexpected character `{other}`"),
                    ));
                }
            }
        };

        tokens.push(Spanned {
            token,
            line,
            column,
        });
    }
}

fn lex_number(cur: &mut Cursor, line: usize, column: usize) -> Result<Token, RuleError> {
    let mut text = String::new();
    cur.take_while(&mut text, |c| c.is_ascii_digit());
    if cur.peek() == Some('.') {
        text.push('.');
        cur.bump();
        cur.take_while(&mut text, |c| c.is_ascii_digit());
    }
    if matches!(cur.peek(), Some('e' | 'E')) {
        text.push('e');
        cur.bump();
        if let Some(sign) = cur.peek().filter(|c| matches!(c, '+' | '-')) {
            text.push(sign);
            cur.bump();
        }
        let digits_before = text.len();
        cur.take_while(&mut text, |c| c.is_ascii_digit());
        if text.len() == digits_before {
            return Err(RuleError::syntax(line, column, "malformed exponent in number"));
        }
    }
    if cur.peek().is_some_and(|c| c.is_alphabetic() || c == '_' || c == '.') {
        return Err(RuleError::syntax(
            cur.line,
            cur.column,
            format!("invalid character after number `{text}`"),
        ));
    }
    text.parse::<f64>()
        .map(Token::Number)
        .map_err(|_| RuleError::syntax(line, column, format!("invalid number `{text}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src)
            .expect("should tokenize")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn lexes_condition() {
        assert_eq!(
            kinds("P_pv[t] >= 1.5 and not False"),
            vec![
                Token::Name("P_pv".into()),
                Token::LBracket,
                Token::Name("t".into()),
                Token::RBracket,
                Token::Ge,
                Token::Number(1.5),
                Token::And,
                Token::Not,
                Token::False,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_compound_assignment_and_exponent() {
        assert_eq!(
            kinds("P_charge[t] += 2e-1"),
            vec![
                Token::Name("P_charge".into()),
                Token::LBracket,
                Token::Name("t".into()),
                Token::RBracket,
                Token::PlusAssign,
                Token::Number(0.2),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("t\n  == 1").expect("should tokenize");
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }

    #[test]
    fn skips_comments() {
        assert_eq!(kinds("1 # one\n"), vec![Token::Number(1.0), Token::Eof]);
    }

    #[test]
    fn rejects_attribute_access() {
        let err = tokenize("P_pv.sum()").expect_err("dot should be rejected");
        assert_eq!(err.location(), Some((1, 5)));
    }

    #[test]
    fn rejects_non_ascii_identifiers() {
        let err = tokenize("P_pv[t] > \u{e9}t\u{e9}").expect_err("non-ASCII letter");
        assert!(matches!(err, RuleError::Syntax { line: 1, column: 11, .. }), "{err:?}");
        let err = tokenize("P_\u{3c0}[t]").expect_err("non-ASCII inside a name");
        assert_eq!(err.location(), Some((1, 3)));
    }

    #[test]
    fn rejects_string_literals() {
        assert!(matches!(
            tokenize("__import__('os')"),
            Err(RuleError::Syntax { column: 12, .. })
        ));
    }

    #[test]
    fn rejects_power_operator() {
        assert!(tokenize("t ** 2").is_err());
    }
}
