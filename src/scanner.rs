use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};

use crate::error::ScanError;
use crate::literal::Literal;
use crate::token::{Token, Type};

/// Character stream to token stream. Tracks only a 1-based line counter;
/// lookahead is done with `peekmore` rather than hand-rolled backtracking.
pub struct Scanner<'a> {
    source: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
    errors: Vec<ScanError>,
    lexeme: String,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source: source.chars().peekmore(),
            tokens: Vec::new(),
            errors: Vec::new(),
            lexeme: String::new(),
            line: 1,
        }
    }

    /// Scans the whole source, returning the tokens produced and any scan
    /// errors encountered. Scanning continues past an error to surface as
    /// many as possible in one pass.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<ScanError>) {
        while !self.is_at_end() {
            self.lexeme.clear();
            self.scan_token();
        }

        self.tokens.push(Token::eof(self.line));
        (self.tokens, self.errors)
    }

    fn is_at_end(&mut self) -> bool {
        self.source.peek().is_none()
    }

    fn advance(&mut self) -> char {
        let c = self.source.next().expect("advance past end of source");
        self.lexeme.push(c);
        c
    }

    fn peek(&mut self) -> char {
        self.source.peek().copied().unwrap_or('\0')
    }

    fn peek_next(&mut self) -> char {
        self.source.peek_next().copied().unwrap_or('\0')
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, r#type: Type, literal: Option<Literal>) {
        self.tokens.push(Token::new(r#type, self.lexeme.clone(), literal, self.line));
    }

    fn string(&mut self) {
        let mut value = String::new();

        while self.peek() != '"' && !self.is_at_end() {
            let c = self.advance();
            if c == '\n' {
                self.line += 1;
            }
            value.push(c);
        }

        if self.is_at_end() {
            self.errors.push(ScanError { line: self.line, message: "Unterminated string".to_string() });
            return;
        }

        self.advance(); // the closing quote
        self.add_token(Type::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // the dot
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let value: f64 = self.lexeme.parse().expect("lexeme is a validated digit sequence");
        self.add_token(Type::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let token_type = match self.lexeme.as_str() {
            "and" => Type::And,
            "class" => Type::Class,
            "else" => Type::Else,
            "false" => Type::False,
            "for" => Type::For,
            "fun" => Type::Fun,
            "if" => Type::If,
            "nil" => Type::Nil,
            "or" => Type::Or,
            "print" => Type::Print,
            "return" => Type::Return,
            "super" => Type::Super,
            "this" => Type::This,
            "true" => Type::True,
            "var" => Type::Var,
            "while" => Type::While,
            _ => Type::Identifier,
        };

        self.add_token(token_type, None);
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(Type::LeftParen, None),
            ')' => self.add_token(Type::RightParen, None),
            '{' => self.add_token(Type::LeftBrace, None),
            '}' => self.add_token(Type::RightBrace, None),
            ',' => self.add_token(Type::Comma, None),
            '.' => self.add_token(Type::Dot, None),
            '-' => self.add_token(Type::Minus, None),
            '+' => self.add_token(Type::Plus, None),
            ';' => self.add_token(Type::Semicolon, None),
            '*' => self.add_token(Type::Star, None),

            '!' => {
                let t = if self.advance_if('=') { Type::BangEqual } else { Type::Bang };
                self.add_token(t, None);
            }
            '=' => {
                let t = if self.advance_if('=') { Type::EqualEqual } else { Type::Equal };
                self.add_token(t, None);
            }
            '<' => {
                let t = if self.advance_if('=') { Type::LessEqual } else { Type::Less };
                self.add_token(t, None);
            }
            '>' => {
                let t = if self.advance_if('=') { Type::GreaterEqual } else { Type::Greater };
                self.add_token(t, None);
            }
            '/' => {
                if self.advance_if('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(Type::Slash, None);
                }
            }

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '"' => self.string(),

            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),

            other => self.errors.push(ScanError {
                line: self.line,
                message: format!("unknown character '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<Type> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty(), "unexpected scan errors: {errors:?}");
        tokens.into_iter().map(|t| t.r#type).collect()
    }

    #[test]
    fn scans_single_and_double_char_tokens() {
        assert_eq!(kinds("!= == <= >="), vec![
            Type::BangEqual, Type::EqualEqual, Type::LessEqual, Type::GreaterEqual, Type::EOF
        ]);
    }

    #[test]
    fn line_comment_consumes_to_newline_and_bumps_line() {
        let (tokens, errors) = Scanner::new("// comment\n1").scan_tokens();
        assert!(errors.is_empty());
        assert_eq!(tokens[0].r#type, Type::Number);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn number_literal_parses_as_f64() {
        let (tokens, _) = Scanner::new("1.5").scan_tokens();
        assert_eq!(tokens[0].literal, Some(Literal::Number(1.5)));
    }

    #[test]
    fn unterminated_string_reports_error_at_ending_line() {
        let (_, errors) = Scanner::new("\"abc\ndef").scan_tokens();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
        assert_eq!(errors[0].message, "Unterminated string");
    }

    #[test]
    fn unknown_character_reports_error_and_continues() {
        let (tokens, errors) = Scanner::new("@ 1").scan_tokens();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unknown character '@'");
        assert_eq!(tokens.last().unwrap().r#type, Type::EOF);
    }

    #[test]
    fn keyword_nil_is_recognized() {
        assert_eq!(kinds("nil"), vec![Type::Nil, Type::EOF]);
    }
}
