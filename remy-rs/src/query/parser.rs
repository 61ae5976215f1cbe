//! Tokenizer and recursive descent parser for notecard queries.
//!
//! Grammar:
//! ```text
//! query      = or_expr
//! or_expr    = and_expr ("OR" and_expr)*
//! and_expr   = not_expr ("AND" not_expr)*
//! not_expr   = "NOT" not_expr | comparison
//! comparison = additive (COMPARE_OP additive | "IN" list)?
//! additive   = primary (("+" | "-") primary)*
//! primary    = IDENT CAST? | STRING CAST? | NUMBER | TRUE | FALSE | NULL
//!            | "(" query ")"
//! list       = "[" (additive ("," additive)*)? "]"
//! ```

use crate::error::{RemyError, Result};
use crate::query::ast::{ArithOp, CompareOp, Node};
use crate::query::cast::{self, CastKind};
use crate::query::value::Value;
use chrono::{DateTime, Utc};

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// Field name, possibly dotted.
    Ident(String),
    /// Quoted string with escapes resolved.
    Str(String),
    /// Integer or float literal, sign included.
    Number(Value),
    And,
    Or,
    Not,
    In,
    True,
    False,
    Null,
    Compare(CompareOp),
    Plus,
    Minus,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    /// `::name` suffix.
    Cast(String),
}

impl Token {
    /// Whether the token ends an operand, so a following sign is an operator.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Ident(_)
                | Token::Str(_)
                | Token::Number(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::CloseParen
                | Token::CloseBracket
                | Token::Cast(_)
        )
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let ch = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let single = match ch {
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            '[' => Some(Token::OpenBracket),
            ']' => Some(Token::CloseBracket),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(tok) = single {
            tokens.push(tok);
            i += 1;
            continue;
        }

        // Quoted string, either quote style
        if ch == '\'' || ch == '"' {
            let quote = ch;
            i += 1;
            let mut s = String::new();
            let mut closed = false;
            while i < len {
                // Only quotes and backslashes are escapable; other backslashes are literal
                if chars[i] == '\\' && matches!(chars.get(i + 1), Some('\\' | '\'' | '"')) {
                    s.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                if chars[i] == quote {
                    closed = true;
                    i += 1;
                    break;
                }
                s.push(chars[i]);
                i += 1;
            }
            if !closed {
                return Err(RemyError::parse(input, "unterminated string literal"));
            }
            tokens.push(Token::Str(s));
            continue;
        }

        // Cast suffix: ::name
        if ch == ':' {
            if i + 1 < len && chars[i + 1] == ':' {
                let start = i + 2;
                let mut end = start;
                while end < len && chars[end].is_ascii_alphabetic() {
                    end += 1;
                }
                if end == start {
                    return Err(RemyError::parse(input, "expected a type name after '::'"));
                }
                tokens.push(Token::Cast(chars[start..end].iter().collect()));
                i = end;
                continue;
            }
            return Err(RemyError::parse(
                input,
                format!("unexpected character ':' at position {}", i),
            ));
        }

        // Comparison operators: !=, <=, >=, <, >, =
        let next = chars.get(i + 1).copied();
        let op = match (ch, next) {
            ('!', Some('=')) => Some(("!=", 2)),
            ('<', Some('=')) => Some(("<=", 2)),
            ('>', Some('=')) => Some((">=", 2)),
            ('<', _) => Some(("<", 1)),
            ('>', _) => Some((">", 1)),
            ('=', _) => Some(("=", 1)),
            _ => None,
        };
        if let Some((symbol, width)) = op {
            tokens.push(Token::Compare(symbol.parse()?));
            i += width;
            continue;
        }

        // A sign starts a number only where an operand is expected
        if ch == '+' || ch == '-' {
            let operand_expected = tokens.last().is_none_or(|t| !t.ends_operand());
            if operand_expected && starts_number(&chars, i + 1) {
                let (number, end) = read_number(input, &chars, i)?;
                tokens.push(Token::Number(number));
                i = end;
            } else {
                tokens.push(if ch == '+' { Token::Plus } else { Token::Minus });
                i += 1;
            }
            continue;
        }

        if starts_number(&chars, i) {
            let (number, end) = read_number(input, &chars, i)?;
            tokens.push(Token::Number(number));
            i = end;
            continue;
        }

        if is_ident_start(ch) {
            let start = i;
            while i < len && is_ident_char(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let tok = match word.to_uppercase().as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                "NOT" => Token::Not,
                "IN" => Token::In,
                "TRUE" => Token::True,
                "FALSE" => Token::False,
                "NULL" => Token::Null,
                _ => Token::Ident(word),
            };
            tokens.push(tok);
            continue;
        }

        return Err(RemyError::parse(
            input,
            format!("unexpected character '{}' at position {}", ch, i),
        ));
    }

    Ok(tokens)
}

/// A digit, or a `.` directly followed by a digit.
fn starts_number(chars: &[char], i: usize) -> bool {
    match chars.get(i) {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Read `[+-](digits[.[digits]] | .digits)[e[+-]digits]` starting at `start`.
fn read_number(input: &str, chars: &[char], start: usize) -> Result<(Value, usize)> {
    let len = chars.len();
    let mut i = start;
    if chars[i] == '+' || chars[i] == '-' {
        i += 1;
    }
    let int_start = i;
    while i < len && chars[i].is_ascii_digit() {
        i += 1;
    }
    let mut is_float = false;
    if i < len && chars[i] == '.' {
        let mut j = i + 1;
        while j < len && chars[j].is_ascii_digit() {
            j += 1;
        }
        if i > int_start || j > i + 1 {
            is_float = true;
            i = j;
        }
    }
    if i < len && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < len && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < len && chars[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < len && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    if i < len && is_ident_char(chars[i]) {
        return Err(RemyError::parse(
            input,
            format!("invalid number at position {}", start),
        ));
    }

    let text: String = chars[start..i].iter().collect();
    let value = if is_float {
        text.parse::<f64>().map(Value::Float).ok()
    } else {
        text.parse::<i64>().map(Value::Integer).ok()
    };
    value
        .map(|v| (v, i))
        .ok_or_else(|| RemyError::parse(input, format!("invalid number '{}'", text)))
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    now: DateTime<Utc>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, tokens: Vec<Token>, now: DateTime<Utc>) -> Self {
        Self {
            input,
            tokens,
            pos: 0,
            now,
        }
    }

    fn error(&self, message: impl Into<String>) -> RemyError {
        RemyError::parse(self.input, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.advance() {
            Some(ref tok) if tok == expected => Ok(()),
            Some(tok) => Err(self.error(format!(
                "expected {:?}, got {:?} at token {}",
                expected, tok, self.pos
            ))),
            None => Err(self.error(format!("expected {:?}, got end of input", expected))),
        }
    }

    fn parse_query(&mut self) -> Result<Node> {
        let node = self.parse_or_expr()?;
        match self.peek() {
            None => Ok(node),
            Some(tok) => Err(self.error(format!(
                "unexpected token {:?} at token {}",
                tok, self.pos
            ))),
        }
    }

    /// or_expr = and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Result<Node> {
        let mut node = self.parse_and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            node = Node::or(node, right);
        }
        Ok(node)
    }

    /// and_expr = not_expr ("AND" not_expr)*
    fn parse_and_expr(&mut self) -> Result<Node> {
        let mut node = self.parse_not_expr()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.parse_not_expr()?;
            node = Node::and(node, right);
        }
        Ok(node)
    }

    /// not_expr = "NOT" not_expr | comparison
    fn parse_not_expr(&mut self) -> Result<Node> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let operand = self.parse_not_expr()?;
            return Ok(Node::not(operand));
        }
        self.parse_comparison()
    }

    /// comparison = additive (COMPARE_OP additive | "IN" list)?
    fn parse_comparison(&mut self) -> Result<Node> {
        let left = self.parse_additive()?;
        match self.peek() {
            Some(Token::Compare(op)) => {
                let op = *op;
                self.require_identifier(&left, op.as_str())?;
                self.advance();
                let right = self.parse_additive()?;
                Ok(Node::compare(op, left, right))
            }
            Some(Token::In) => {
                self.require_identifier(&left, "IN")?;
                self.advance();
                let values = self.parse_list()?;
                Ok(Node::in_list(left, values))
            }
            _ => Ok(left),
        }
    }

    fn require_identifier(&self, node: &Node, op: &str) -> Result<()> {
        match node {
            Node::Identifier { .. } => Ok(()),
            other => Err(self.error(format!(
                "left side of '{}' must be a field name, got {}",
                op, other
            ))),
        }
    }

    /// additive = primary (("+" | "-") primary)*
    fn parse_additive(&mut self) -> Result<Node> {
        let mut node = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_primary()?;
            node = Node::binary(op, node, right);
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Node> {
        let Some(tok) = self.advance() else {
            return Err(self.error("unexpected end of input"));
        };
        match tok {
            // A bare word followed by a cast is read like a quoted string
            Token::Ident(name) => match self.peek() {
                Some(Token::Cast(_)) => self.parse_cast(&name),
                _ => Ok(Node::identifier(name)),
            },
            Token::Str(text) => match self.peek() {
                Some(Token::Cast(_)) => self.parse_cast(&text),
                _ => Ok(Node::literal(text)),
            },
            Token::Number(value) => {
                if let Some(Token::Cast(name)) = self.peek() {
                    return Err(self.error(format!("cannot cast a number to '{}'", name)));
                }
                Ok(Node::Literal { value })
            }
            Token::True => Ok(Node::literal(true)),
            Token::False => Ok(Node::literal(false)),
            Token::Null => Ok(Node::null()),
            Token::OpenParen => {
                let node = self.parse_or_expr()?;
                self.expect(&Token::CloseParen)?;
                Ok(node)
            }
            other => Err(self.error(format!(
                "unexpected token {:?} at token {}",
                other,
                self.pos - 1
            ))),
        }
    }

    fn parse_cast(&mut self, text: &str) -> Result<Node> {
        let Some(Token::Cast(name)) = self.advance() else {
            return Err(self.error("expected a cast"));
        };
        let kind = CastKind::from_name(&name)
            .ok_or_else(|| self.error(format!("unknown cast type '::{}'", name)))?;
        cast::cast(kind, text, self.now).map_err(|message| self.error(message))
    }

    /// list = "[" (additive ("," additive)*)? "]"
    fn parse_list(&mut self) -> Result<Vec<Node>> {
        self.expect(&Token::OpenBracket)?;
        let mut values = Vec::new();
        if self.peek() == Some(&Token::CloseBracket) {
            self.advance();
            return Ok(values);
        }
        loop {
            values.push(self.parse_additive()?);
            if self.peek() != Some(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::CloseBracket)?;
        Ok(values)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a query, binding `now` and `today` to the current time.
pub fn parse_query(input: &str) -> Result<Node> {
    parse_query_at(input, Utc::now())
}

/// Parse a query, binding `now` and `today` to the given instant.
pub fn parse_query_at(input: &str, now: DateTime<Utc>) -> Result<Node> {
    if input.trim().is_empty() {
        return Err(RemyError::EmptyQuery);
    }
    let tokens = tokenize(input)?;
    let node = Parser::new(input, tokens, now).parse_query()?;
    tracing::trace!(query = input, parsed = %node, "parsed query");
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::{TimeUnit, Timedelta};
    use chrono::{NaiveDate, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap()
    }

    fn parse(input: &str) -> Node {
        parse_query_at(input, fixed_now()).unwrap()
    }

    fn eq(field: &str, value: Node) -> Node {
        Node::compare(CompareOp::Eq, Node::identifier(field), value)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ========================================================================
    // Tokenizer
    // ========================================================================

    #[test]
    fn test_tokenize_comparison() {
        let tokens = tokenize("tag >= 'x'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("tag".to_string()),
                Token::Compare(CompareOp::Ge),
                Token::Str("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_sign_depends_on_context() {
        let tokens = tokenize("x = -10").unwrap();
        assert_eq!(tokens[2], Token::Number(Value::Integer(-10)));

        let tokens = tokenize("'now'::timestamp -1").unwrap();
        assert_eq!(tokens[2], Token::Minus);
    }

    #[test]
    fn test_tokenize_keywords_whole_word_only() {
        let tokens = tokenize("notifier and Nothing").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("notifier".to_string()),
                Token::And,
                Token::Ident("Nothing".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_unterminated_string() {
        assert!(tokenize("name = 'abc").is_err());
    }

    // ========================================================================
    // Literals
    // ========================================================================

    #[test]
    fn test_string_literals() {
        assert_eq!(parse("name = 'value'"), eq("name", Node::literal("value")));
        assert_eq!(parse("name = \"value\""), eq("name", Node::literal("value")));
        assert_eq!(
            parse(r"name = 'it\'s'"),
            eq("name", Node::literal("it's"))
        );
        assert_eq!(
            parse(r#"name = "say \"hi\" \\ bye""#),
            eq("name", Node::literal(r#"say "hi" \ bye"#))
        );
    }

    #[test]
    fn test_other_backslashes_are_kept() {
        assert_eq!(
            parse(r"path = 'C:\temp\new'"),
            eq("path", Node::literal(r"C:\temp\new"))
        );
        assert_eq!(parse(r"path = 'a\\b'"), eq("path", Node::literal(r"a\b")));
        assert_eq!(parse(r#"path = 'a\"b'"#), eq("path", Node::literal(r#"a"b"#)));
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(parse("n = 42"), eq("n", Node::literal(42i64)));
        assert_eq!(parse("n = -10"), eq("n", Node::literal(-10i64)));
        assert_eq!(parse("n = 19.99"), eq("n", Node::literal(19.99)));
        assert_eq!(parse("n = 1.5e10"), eq("n", Node::literal(1.5e10)));
        assert_eq!(parse("n = +3"), eq("n", Node::literal(3i64)));
    }

    #[test]
    fn test_bare_decimal_point_numbers() {
        assert_eq!(parse("score = .5"), eq("score", Node::literal(0.5)));
        assert_eq!(parse("score = 1."), eq("score", Node::literal(1.0)));
        assert_eq!(parse("score = -.25"), eq("score", Node::literal(-0.25)));
        assert_eq!(parse("score = 1.e2"), eq("score", Node::literal(100.0)));
        assert!(parse_query_at("score = 1.x", fixed_now()).is_err());
        assert!(parse_query_at("score = 1.2.3", fixed_now()).is_err());
    }

    #[test]
    fn test_keyword_literals_case_insensitive() {
        assert_eq!(parse("done = TRUE"), eq("done", Node::literal(true)));
        assert_eq!(parse("done = false"), eq("done", Node::literal(false)));
        assert_eq!(parse("owner = Null"), eq("owner", Node::null()));
    }

    #[test]
    fn test_dotted_identifier() {
        assert_eq!(
            parse("meta.author.name = 'x'"),
            eq("meta.author.name", Node::literal("x"))
        );
    }

    // ========================================================================
    // Structure
    // ========================================================================

    #[test]
    fn test_precedence_not_and_or() {
        let expected = Node::or(
            Node::and(
                Node::not(eq("a", Node::literal(1i64))),
                eq("b", Node::literal(2i64)),
            ),
            eq("c", Node::literal(3i64)),
        );
        assert_eq!(parse("NOT a = 1 AND b = 2 OR c = 3"), expected);
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expected = Node::and(
            eq("a", Node::literal(1i64)),
            Node::or(eq("b", Node::literal(2i64)), eq("c", Node::literal(3i64))),
        );
        assert_eq!(parse("a = 1 and (b = 2 or c = 3)"), expected);
    }

    #[test]
    fn test_and_is_left_associative() {
        let expected = Node::and(
            Node::and(eq("a", Node::literal(1i64)), eq("b", Node::literal(2i64))),
            eq("c", Node::literal(3i64)),
        );
        assert_eq!(parse("a = 1 AND b = 2 AND c = 3"), expected);
    }

    #[test]
    fn test_in_lists() {
        assert_eq!(
            parse("tag IN ['a', 'b']"),
            Node::in_list(
                Node::identifier("tag"),
                vec![Node::literal("a"), Node::literal("b")]
            )
        );
        assert_eq!(
            parse("tag in []"),
            Node::in_list(Node::identifier("tag"), vec![])
        );
    }

    #[test]
    fn test_all_comparison_operators() {
        for (text, op) in [
            ("=", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<", CompareOp::Lt),
            ("<=", CompareOp::Le),
            (">", CompareOp::Gt),
            (">=", CompareOp::Ge),
        ] {
            let node = parse(&format!("score {} 90", text));
            assert_eq!(
                node,
                Node::compare(op, Node::identifier("score"), Node::literal(90i64))
            );
        }
    }

    // ========================================================================
    // Temporal literals
    // ========================================================================

    #[test]
    fn test_casts() {
        assert_eq!(
            parse("due = '2024-06-15'::date"),
            eq("due", Node::date(date(2024, 6, 15)))
        );
        assert_eq!(
            parse("at = '2024-06-15 10:00:00+05:00'::TIMESTAMP"),
            eq("at", Node::datetime(date(2024, 6, 15).and_hms_opt(5, 0, 0).unwrap()))
        );
        assert_eq!(
            parse("due < today::date"),
            Node::compare(
                CompareOp::Lt,
                Node::identifier("due"),
                Node::date(date(2024, 6, 15))
            )
        );
    }

    #[test]
    fn test_explicit_arithmetic() {
        let node = parse("due >= 'today'::date - '1 week'::timedelta");
        let expected = Node::compare(
            CompareOp::Ge,
            Node::identifier("due"),
            Node::binary(
                ArithOp::Sub,
                Node::date(date(2024, 6, 15)),
                Node::timedelta(Timedelta::from_unit(1, TimeUnit::Weeks)),
            ),
        );
        assert_eq!(node, expected);
    }

    #[test]
    fn test_embedded_arithmetic_matches_explicit_form() {
        assert_eq!(
            parse("at > 'today - 48 hours'::timestamp"),
            parse("at > 'today'::date - '48 hours'::timedelta")
        );
    }

    #[test]
    fn test_timedelta_before_date() {
        let node = parse("due = '1 day'::timedelta + '2024-01-01'::date");
        assert_eq!(
            node,
            eq(
                "due",
                Node::binary(
                    ArithOp::Add,
                    Node::timedelta(Timedelta::from_unit(1, TimeUnit::Days)),
                    Node::date(date(2024, 1, 1)),
                )
            )
        );
    }

    // ========================================================================
    // Errors
    // ========================================================================

    #[test]
    fn test_empty_query() {
        assert!(matches!(parse_query(""), Err(RemyError::EmptyQuery)));
        assert!(matches!(parse_query("   \t"), Err(RemyError::EmptyQuery)));
    }

    #[test]
    fn test_syntax_errors() {
        for input in [
            "name =",
            "= 'value'",
            "AND OR",
            "(a = 1",
            "a = 1)",
            "a = 1 b = 2",
            "tag IN ['a',",
            "x = 2days",
        ] {
            match parse_query_at(input, fixed_now()) {
                Err(e @ RemyError::Parse { .. }) => {
                    assert!(e.to_string().contains("Failed to parse"), "{}", input);
                }
                other => panic!("Expected parse error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_bad_casts() {
        assert!(parse_query_at("d = '2024-01-31 10:00:00'::date", fixed_now()).is_err());
        assert!(parse_query_at("d = '01:30 hours'::timedelta", fixed_now()).is_err());
        assert!(parse_query_at("d = '5 fortnights'::timedelta", fixed_now()).is_err());
        assert!(parse_query_at("d = 'x'::interval", fixed_now()).is_err());
        assert!(parse_query_at("d = 5::date", fixed_now()).is_err());
    }

    #[test]
    fn test_literal_on_left_is_rejected() {
        assert!(parse_query_at("'x' = tag", fixed_now()).is_err());
    }
}
