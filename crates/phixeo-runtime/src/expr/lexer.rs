//! Tokenizer for node text.

use crate::error::EvalError;

use super::BinaryOp;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    AugAssign(BinaryOp),
    Eof,
}

/// A token with the (0-based) column it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub column: usize,
}

/// Operators in priority order (longest match first).
const OPERATORS: &[(&str, Token)] = &[
    ("**=", Token::AugAssign(BinaryOp::Pow)),
    ("//=", Token::AugAssign(BinaryOp::FloorDiv)),
    ("+=", Token::AugAssign(BinaryOp::Add)),
    ("-=", Token::AugAssign(BinaryOp::Sub)),
    ("*=", Token::AugAssign(BinaryOp::Mul)),
    ("/=", Token::AugAssign(BinaryOp::Div)),
    ("%=", Token::AugAssign(BinaryOp::Mod)),
    ("**", Token::StarStar),
    ("//", Token::SlashSlash),
    ("==", Token::EqEq),
    ("!=", Token::NotEq),
    ("<=", Token::Le),
    (">=", Token::Ge),
    ("(", Token::LParen),
    (")", Token::RParen),
    ("[", Token::LBracket),
    ("]", Token::RBracket),
    (",", Token::Comma),
    (":", Token::Colon),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("*", Token::Star),
    ("/", Token::Slash),
    ("%", Token::Percent),
    ("<", Token::Lt),
    (">", Token::Gt),
    ("=", Token::Assign),
];

/// Stateful cursor over the input characters.
struct Cursor {
    src: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(src: &str) -> Self {
        Cursor {
            src: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|&c| pred(c)) {
            out.push(c);
            self.pos += 1;
        }
        out
    }
}

fn syntax(column: usize, message: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        column,
        message: message.into(),
    }
}

/// Splits `src` into tokens, ending with [`Token::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, EvalError> {
    let mut cur = Cursor::new(src);
    let mut tokens = Vec::new();

    loop {
        cur.take_while(char::is_whitespace);
        let column = cur.pos;
        let Some(c) = cur.peek() else {
            tokens.push(Spanned {
                token: Token::Eof,
                column,
            });
            return Ok(tokens);
        };

        let token = if c == '#' {
            cur.pos = cur.src.len();
            continue;
        } else if c.is_ascii_digit() || (c == '.' && cur.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            number(&mut cur, column)?
        } else if c == '\'' || c == '"' {
            string(&mut cur, column)?
        } else if c.is_alphabetic() || c == '_' {
            Token::Name(cur.take_while(|c| c.is_alphanumeric() || c == '_'))
        } else if let Some((op, token)) = OPERATORS.iter().find(|(op, _)| cur.starts_with(op)) {
            cur.pos += op.chars().count();
            token.clone()
        } else {
            return Err(syntax(column, format!("unexpected character '{c}'")));
        };
        tokens.push(Spanned { token, column });
    }
}

fn number(cur: &mut Cursor, column: usize) -> Result<Token, EvalError> {
    let mut text = cur.take_while(|c| c.is_ascii_digit());
    let mut is_float = false;
    if cur.peek() == Some('.') {
        is_float = true;
        cur.bump();
        text.push('.');
        text.push_str(&cur.take_while(|c| c.is_ascii_digit()));
    }
    if matches!(cur.peek(), Some('e' | 'E')) {
        let sign = cur.peek_at(1).filter(|c| *c == '+' || *c == '-');
        let digit_at = if sign.is_some() { 2 } else { 1 };
        if cur.peek_at(digit_at).is_some_and(|d| d.is_ascii_digit()) {
            is_float = true;
            cur.bump();
            text.push('e');
            if let Some(sign) = sign {
                cur.bump();
                text.push(sign);
            }
            text.push_str(&cur.take_while(|c| c.is_ascii_digit()));
        }
    }

    if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| syntax(column, format!("invalid number '{text}'")))
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| syntax(column, format!("integer literal '{text}' is too large")))
    }
}

fn string(cur: &mut Cursor, column: usize) -> Result<Token, EvalError> {
    let quote = cur.bump();
    let mut out = String::new();
    loop {
        match cur.bump() {
            None => return Err(syntax(column, "unterminated string literal")),
            Some(c) if Some(c) == quote => return Ok(Token::Str(out)),
            Some('\\') => match cur.bump() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => return Err(syntax(column, "unterminated string literal")),
            },
            Some(c) => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn tokenizes_call() {
        assert_eq!(
            kinds("print('Start')"),
            vec![
                Token::Name("print".into()),
                Token::LParen,
                Token::Str("Start".into()),
                Token::RParen,
                Token::Eof
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("a **= 2 // 3 == 4"),
            vec![
                Token::Name("a".into()),
                Token::AugAssign(BinaryOp::Pow),
                Token::Int(2),
                Token::SlashSlash,
                Token::Int(3),
                Token::EqEq,
                Token::Int(4),
                Token::Eof
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("1.5")[0], Token::Float(1.5));
        assert_eq!(kinds(".5")[0], Token::Float(0.5));
        assert_eq!(kinds("2e3")[0], Token::Float(2000.0));
        assert_eq!(kinds("42")[0], Token::Int(42));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r#""a\"b\n""#)[0], Token::Str("a\"b\n".into()));
    }

    #[test]
    fn comments_end_the_line() {
        assert_eq!(kinds("x # note"), vec![Token::Name("x".into()), Token::Eof]);
    }

    #[test]
    fn columns_are_recorded() {
        let tokens = tokenize("x  = 1").unwrap();
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(matches!(
            tokenize("print('oops)"),
            Err(EvalError::Syntax { column: 6, .. })
        ));
    }

    #[test]
    fn rejects_unknown_character() {
        assert!(matches!(tokenize("a $ b"), Err(EvalError::Syntax { column: 2, .. })));
    }

    #[test]
    fn rejects_oversized_integer() {
        assert!(tokenize("99999999999999999999").is_err());
    }
}
