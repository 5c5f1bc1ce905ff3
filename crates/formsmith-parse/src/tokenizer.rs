use std::convert::TryFrom;
use std::error::Error;
use std::fmt::{self, Display, Write as _};

const TOKEN_ENDERS: &str = " \t\r\n()+-*/\"";

const fn build_token_enders() -> [bool; 256] {
    let mut tbl = [false; 256];
    let bytes = TOKEN_ENDERS.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        tbl[bytes[i] as usize] = true;
        i += 1;
    }
    tbl
}
static TOKEN_ENDERS_TABLE: [bool; 256] = build_token_enders();

#[inline(always)]
fn is_token_ender(c: u8) -> bool {
    TOKEN_ENDERS_TABLE[c as usize]
}

/// Represents operator associativity.
#[derive(Debug, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// A custom error type for the tokenizer.
#[derive(Debug)]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerError: {}", self.message)
    }
}

impl Error for TokenizerError {}

/// The type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Operand,
    Paren,
    OpPrefix,
    OpInfix,
    Whitespace,
}

impl Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The subtype of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSubType {
    None,
    /// A double-quoted string literal.
    Text,
    /// A decimal number literal (`12`, `2.5`, `.5`).
    Number,
    /// Any other run of characters; not evaluable.
    Word,
    Open,
    Close,
}

impl Display for TokenSubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A token in a derived-field formula.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Token {
    pub value: String,
    pub token_type: TokenType,
    pub subtype: TokenSubType,
    pub start: usize,
    pub end: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} subtype: {:?} value: {}>",
            self.token_type, self.subtype, self.value
        )
    }
}

impl Token {
    fn from_slice(
        source: &str,
        token_type: TokenType,
        subtype: TokenSubType,
        start: usize,
        end: usize,
    ) -> Self {
        Token {
            value: source[start..end].to_string(),
            token_type,
            subtype,
            start,
            end,
        }
    }

    pub fn get_precedence(&self) -> Option<(u8, Associativity)> {
        // For a prefix operator, use the 'u' key.
        let op = if self.token_type == TokenType::OpPrefix {
            "u"
        } else {
            self.value.as_str()
        };

        match op {
            "u" => Some((3, Associativity::Right)),
            "*" | "/" => Some((2, Associativity::Left)),
            "+" | "-" => Some((1, Associativity::Left)),
            _ => None,
        }
    }

    fn make_operand_from_slice(source: &str, start: usize, end: usize) -> Self {
        let value_str = &source[start..end];
        let subtype = if value_str.starts_with('"') {
            TokenSubType::Text
        } else if is_decimal_literal(value_str) {
            TokenSubType::Number
        } else {
            TokenSubType::Word
        };
        Token::from_slice(source, TokenType::Operand, subtype, start, end)
    }
}

/// Digits with at most one decimal point. Exponents, `inf` and `NaN` are not
/// part of the formula language.
fn is_decimal_literal(s: &str) -> bool {
    let mut digits = 0usize;
    let mut dots = 0usize;
    for b in s.bytes() {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// A tokenizer for derived-field formulas.
///
/// There is no leading `=`; the whole input is an
/// expression. Unknown character runs become `Word` operands so the caller
/// can decide to treat the formula as display text.
pub struct Tokenizer {
    formula: String,
    pub items: Vec<Token>,
    token_stack: Vec<Token>,
    offset: usize,      // Byte offset in formula
    token_start: usize, // Start of current token
    token_end: usize,   // End of current token
}

impl Tokenizer {
    /// Create a new tokenizer and immediately tokenize the formula.
    pub fn new(formula: &str) -> Result<Self, TokenizerError> {
        let mut tokenizer = Tokenizer {
            formula: formula.to_string(),
            items: Vec::with_capacity(formula.len() / 2),
            token_stack: Vec::with_capacity(8),
            offset: 0,
            token_start: 0,
            token_end: 0,
        };
        tokenizer.parse()?;
        Ok(tokenizer)
    }

    /// Check if we have a token accumulated
    #[inline]
    fn has_token(&self) -> bool {
        self.token_end > self.token_start
    }

    /// Start a new token at current position
    #[inline]
    fn start_token(&mut self) {
        self.token_start = self.offset;
        self.token_end = self.offset;
    }

    /// Extend current token to current position
    #[inline]
    fn extend_token(&mut self) {
        self.token_end = self.offset;
    }

    fn parse(&mut self) -> Result<(), TokenizerError> {
        self.start_token();

        while self.offset < self.formula.len() {
            let curr_byte = self.formula.as_bytes()[self.offset];

            if is_token_ender(curr_byte) && self.has_token() {
                self.save_token();
                self.start_token();
            }

            match curr_byte {
                b'"' => self.parse_string()?,
                b' ' | b'\t' | b'\r' | b'\n' => self.parse_whitespace(),
                b'+' | b'-' | b'*' | b'/' => self.parse_operator(),
                b'(' => self.parse_opener(),
                b')' => self.parse_closer()?,
                _ => {
                    if !self.has_token() {
                        self.start_token();
                    }
                    self.offset += 1;
                    self.extend_token();
                }
            }
        }

        if self.has_token() {
            self.save_token();
        }

        if !self.token_stack.is_empty() {
            return Err(TokenizerError {
                message: "Unmatched opening parenthesis".to_string(),
                pos: self.offset,
            });
        }

        Ok(())
    }

    fn save_token(&mut self) {
        if self.has_token() {
            let token =
                Token::make_operand_from_slice(&self.formula, self.token_start, self.token_end);
            self.items.push(token);
        }
    }

    /// Parse a double-quoted string literal with backslash escapes.
    fn parse_string(&mut self) -> Result<(), TokenizerError> {
        let string_start = self.offset;
        self.offset += 1; // Skip opening quote

        while self.offset < self.formula.len() {
            match self.formula.as_bytes()[self.offset] {
                b'\\' => self.offset += 2,
                b'"' => {
                    self.offset += 1;
                    let token =
                        Token::make_operand_from_slice(&self.formula, string_start, self.offset);
                    self.items.push(token);
                    self.start_token();
                    return Ok(());
                }
                _ => self.offset += 1,
            }
        }

        Err(TokenizerError {
            message: "Reached end of formula while parsing string".to_string(),
            pos: string_start,
        })
    }

    fn parse_whitespace(&mut self) {
        let ws_start = self.offset;
        while self.offset < self.formula.len() {
            match self.formula.as_bytes()[self.offset] {
                b' ' | b'\t' | b'\r' | b'\n' => self.offset += 1,
                _ => break,
            }
        }

        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Whitespace,
            TokenSubType::None,
            ws_start,
            self.offset,
        ));
        self.start_token();
    }

    fn parse_operator(&mut self) {
        let prev = self
            .items
            .iter()
            .rev()
            .find(|t| t.token_type != TokenType::Whitespace);
        let token_type = match prev {
            Some(p) if p.subtype == TokenSubType::Close || p.token_type == TokenType::Operand => {
                TokenType::OpInfix
            }
            _ => {
                let curr_byte = self.formula.as_bytes()[self.offset];
                if curr_byte == b'+' || curr_byte == b'-' {
                    TokenType::OpPrefix
                } else {
                    // A leading `*` or `/` is still infix; the parser rejects it.
                    TokenType::OpInfix
                }
            }
        };

        self.items.push(Token::from_slice(
            &self.formula,
            token_type,
            TokenSubType::None,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
        self.start_token();
    }

    fn parse_opener(&mut self) {
        let token = Token::from_slice(
            &self.formula,
            TokenType::Paren,
            TokenSubType::Open,
            self.offset,
            self.offset + 1,
        );
        self.items.push(token.clone());
        self.token_stack.push(token);
        self.offset += 1;
        self.start_token();
    }

    fn parse_closer(&mut self) -> Result<(), TokenizerError> {
        if self.token_stack.pop().is_none() {
            return Err(TokenizerError {
                message: format!("No matching opener for closer at position {}", self.offset),
                pos: self.offset,
            });
        }

        self.items.push(Token::from_slice(
            &self.formula,
            TokenType::Paren,
            TokenSubType::Close,
            self.offset,
            self.offset + 1,
        ));
        self.offset += 1;
        self.start_token();
        Ok(())
    }

    /// Reconstruct the formula from the tokens.
    pub fn render(&self) -> String {
        self.items.iter().map(|t| t.value.as_str()).collect()
    }

    /// Tokens without whitespace.
    pub fn significant(&self) -> impl Iterator<Item = &Token> {
        self.items
            .iter()
            .filter(|t| t.token_type != TokenType::Whitespace)
    }
}

impl TryFrom<&str> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Tokenizer::new(value)
    }
}

impl TryFrom<String> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tokenizer::new(&value)
    }
}

/// Quote `text` as a formula string literal (JSON string syntax).
pub fn quote_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decode a string literal produced by [`quote_text`] (surrounding quotes
/// included). Returns `None` for a malformed escape.
pub fn unquote_text(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return None;
                }
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
