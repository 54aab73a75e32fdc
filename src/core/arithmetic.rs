//! Integer evaluation of substituted round-key expressions.
//!
//! A small recursive-descent evaluator for the arithmetic these expressions
//! can contain: integer literals, parentheses, unary `+ - ~`, and binary
//! `* % + - << >> >>> & ^ |` with JavaScript precedence. Additive and
//! multiplicative operators work on 64-bit integers; bitwise operators first
//! truncate their operands to 32 bits (two's complement), as JavaScript does.

use crate::errors::SlotError;

/// Nesting limit for parentheses and unary chains.
const MAX_DEPTH: usize = 64;

/// Operator spellings, longest first so `>>>` wins over `>>`.
const OPERATORS: [&str; 11] = [">>>", ">>", "<<", "+", "-", "*", "%", "&", "^", "|", "~"];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// JavaScript `ToInt32` for integral values.
pub fn to_int32(v: i64) -> i32 {
    v as i32
}

/// JavaScript `ToUint32` for integral values.
pub fn to_uint32(v: i64) -> u32 {
    v as u32
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// End of the numeric literal starting at `start` (which must be a digit).
fn number_end(bytes: &[u8], start: usize) -> usize {
    let prefixed = bytes.get(start) == Some(&b'0')
        && matches!(
            bytes.get(start + 1),
            Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B')
        );
    let mut pos = start;
    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
            pos += 1;
        } else if !prefixed && (b == b'+' || b == b'-') && matches!(bytes[pos - 1], b'e' | b'E') {
            pos += 1;
        } else {
            break;
        }
    }
    pos
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    let mut pos = start;
    while pos < bytes.len() && is_ident_part(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// Parse one integer literal: decimal, `0x`, `0o`, `0b`, or a decimal with
/// fraction/exponent whose value is integral.
pub fn parse_number(raw: &str) -> Result<i64, SlotError> {
    let text = raw.replace('_', "");
    let bad = || SlotError::Evaluation(format!("invalid number literal `{raw}`"));

    let radix_body = |prefixes: [&str; 2]| {
        prefixes
            .iter()
            .find_map(|p| text.strip_prefix(p))
            .map(str::to_string)
    };
    if let Some(body) = radix_body(["0x", "0X"]) {
        return i64::from_str_radix(&body, 16).map_err(|_| bad());
    }
    if let Some(body) = radix_body(["0o", "0O"]) {
        return i64::from_str_radix(&body, 8).map_err(|_| bad());
    }
    if let Some(body) = radix_body(["0b", "0B"]) {
        return i64::from_str_radix(&body, 2).map_err(|_| bad());
    }
    if let Ok(v) = text.parse::<i64>() {
        return Ok(v);
    }

    let v: f64 = text.parse().map_err(|_| bad())?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.2e18 {
        Ok(v as i64)
    } else {
        Err(SlotError::Evaluation(format!(
            "`{raw}` is not an integer in range"
        )))
    }
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// Identifier names referenced by `text`, in first-occurrence order.
/// Hex digits inside numeric literals are not mistaken for names.
pub fn identifiers(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut names: Vec<String> = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if is_ident_start(b) {
            let end = ident_end(bytes, pos);
            let name = &text[pos..end];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            pos = end;
        } else if b.is_ascii_digit() {
            pos = number_end(bytes, pos);
        } else {
            pos += 1;
        }
    }
    names
}

/// Replace every identifier token in `text` for which `lookup` has a value.
/// Everything else, including numeric literals, is copied verbatim.
pub fn substitute<'v>(text: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    let mut copied = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if is_ident_start(b) {
            let end = ident_end(bytes, pos);
            if let Some(value) = lookup(&text[pos..end]) {
                out.push_str(&text[copied..pos]);
                out.push_str(value);
                copied = end;
            }
            pos = end;
        } else if b.is_ascii_digit() {
            pos = number_end(bytes, pos);
        } else {
            pos += 1;
        }
    }
    out.push_str(&text[copied..]);
    out
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(i64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<Token>, SlotError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_whitespace() {
            pos += 1;
        } else if b.is_ascii_digit() || (b == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            let end = number_end(bytes, pos);
            tokens.push(Token::Num(parse_number(&text[pos..end])?));
            pos = end;
        } else if is_ident_start(b) {
            let end = ident_end(bytes, pos);
            tokens.push(Token::Ident(text[pos..end].to_string()));
            pos = end;
        } else if b == b'(' {
            tokens.push(Token::LParen);
            pos += 1;
        } else if b == b')' {
            tokens.push(Token::RParen);
            pos += 1;
        } else if let Some(op) = OPERATORS.iter().find(|op| text[pos..].starts_with(**op)) {
            tokens.push(Token::Op(*op));
            pos += op.len();
        } else {
            let c = text[pos..].chars().next().unwrap_or('?');
            return Err(SlotError::Evaluation(format!(
                "unexpected `{c}` at offset {pos} in `{text}`"
            )));
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

fn binary_precedence(op: &str) -> Option<u8> {
    match op {
        "|" => Some(1),
        "^" => Some(2),
        "&" => Some(3),
        "<<" | ">>" | ">>>" => Some(4),
        "+" | "-" => Some(5),
        "*" | "%" => Some(6),
        _ => None,
    }
}

fn overflow(op: &str, a: i64, b: i64) -> SlotError {
    SlotError::Evaluation(format!("overflow in `{a} {op} {b}`"))
}

/// Apply a binary operator with JavaScript integer semantics.
pub fn apply_binary(op: &str, a: i64, b: i64) -> Result<i64, SlotError> {
    let shift = to_uint32(b) & 31;
    match op {
        "+" => a.checked_add(b).ok_or_else(|| overflow(op, a, b)),
        "-" => a.checked_sub(b).ok_or_else(|| overflow(op, a, b)),
        "*" => a.checked_mul(b).ok_or_else(|| overflow(op, a, b)),
        "%" => {
            if b == 0 {
                Err(SlotError::Evaluation(format!("`{a} % 0` is NaN")))
            } else {
                Ok(a.wrapping_rem(b))
            }
        }
        "&" => Ok((to_int32(a) & to_int32(b)) as i64),
        "^" => Ok((to_int32(a) ^ to_int32(b)) as i64),
        "|" => Ok((to_int32(a) | to_int32(b)) as i64),
        "<<" => Ok(to_int32(a).wrapping_shl(shift) as i64),
        ">>" => Ok((to_int32(a) >> shift) as i64),
        ">>>" => Ok((to_uint32(a) >> shift) as i64),
        _ => Err(SlotError::Evaluation(format!("unsupported operator `{op}`"))),
    }
}

/// Apply a prefix operator with JavaScript integer semantics.
pub fn apply_unary(op: &str, a: i64) -> Result<i64, SlotError> {
    match op {
        "-" => a
            .checked_neg()
            .ok_or_else(|| SlotError::Evaluation(format!("overflow in `-{a}`"))),
        "+" => Ok(a),
        "~" => Ok(!to_int32(a) as i64),
        _ => Err(SlotError::Evaluation(format!(
            "unsupported prefix operator `{op}`"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Evaluator {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Evaluator {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn descend(&mut self) -> Result<(), SlotError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(SlotError::Evaluation("expression nested too deeply".to_string()))
        } else {
            Ok(())
        }
    }

    fn binary(&mut self, min_prec: u8) -> Result<i64, SlotError> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            let Some(prec) = binary_precedence(op) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(prec + 1)?;
            lhs = apply_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<i64, SlotError> {
        if let Some(Token::Op(op @ ("-" | "+" | "~"))) = self.peek() {
            let op = *op;
            self.pos += 1;
            self.descend()?;
            let value = self.unary()?;
            self.depth -= 1;
            return apply_unary(op, value);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<i64, SlotError> {
        match self.next() {
            Some(Token::Num(v)) => Ok(v),
            Some(Token::Ident(name)) => Err(SlotError::UnresolvedVariable(name)),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.binary(0)?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(SlotError::Evaluation("missing `)`".to_string())),
                }
            }
            Some(tok) => Err(SlotError::Evaluation(format!("unexpected token {tok:?}"))),
            None => Err(SlotError::Evaluation("unexpected end of expression".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate `text` to a 64-bit intermediate value.
///
/// Any identifier left in the text is reported as
/// [`SlotError::UnresolvedVariable`].
pub fn evaluate_i64(text: &str) -> Result<i64, SlotError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(SlotError::Evaluation("empty expression".to_string()));
    }
    let mut ev = Evaluator {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = ev.binary(0)?;
    match ev.peek() {
        None => Ok(value),
        Some(tok) => Err(SlotError::Evaluation(format!(
            "trailing token {tok:?} in `{text}`"
        ))),
    }
}

/// Evaluate `text` to a signed 32-bit word.
pub fn evaluate(text: &str) -> Result<i32, SlotError> {
    evaluate_i64(text).map(to_int32)
}
