//! Port expression parsing
//!
//! A port expression selects the ports a rule side applies to:
//!
//! | Expression | Operator |
//! |------------|----------|
//! | *(empty)*  | [`PortOperator::None`] (any port) |
//! | `80`       | [`PortOperator::Equal`] |
//! | `!=22`     | [`PortOperator::NotEqual`] |
//! | `<1024`    | [`PortOperator::LessThan`] |
//! | `<=1024`   | [`PortOperator::LessOrEqual`] |
//! | `>1023`    | [`PortOperator::GreaterThan`] |
//! | `>=1024`   | [`PortOperator::GreaterOrEqual`] |
//! | `1:1024`   | [`PortOperator::RangeInclusive`] |
//! | `10><20`   | [`PortOperator::RangeExclusive`] |
//! | `10<>20`   | [`PortOperator::RangeExcept`] |
//!
//! The text is split into tokens by a `logos` lexer and then fed through
//! `PortState`, a finite-state machine whose `step` table lists every legal
//! transition. Anything not in the table is rejected, so a parsed
//! [`PortSpec`] always carries exactly as many ports as its operator needs.
//!
//! # Example
//!
//! ```
//! use pfrule::core::port::{parse_port, PortOperator};
//!
//! let spec = parse_port("1:1024").unwrap();
//! assert_eq!(spec.operator(), PortOperator::RangeInclusive);
//! assert_eq!(spec.ports(), vec![1, 1024]);
//! ```

use logos::Logos;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::error::ParseError;

/// Comparison applied to the port(s) of a [`PortSpec`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PortOperator {
    /// No port restriction
    #[default]
    None,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    /// `a:b`, ports from a to b including both ends
    RangeInclusive,
    /// `a><b`, ports strictly between a and b
    RangeExclusive,
    /// `a<>b`, ports outside of a to b
    RangeExcept,
}

impl PortOperator {
    /// Number of ports the operator takes (0, 1 or 2).
    pub const fn operand_count(self) -> usize {
        match self {
            PortOperator::None => 0,
            PortOperator::RangeInclusive
            | PortOperator::RangeExclusive
            | PortOperator::RangeExcept => 2,
            _ => 1,
        }
    }

    pub const fn is_range(self) -> bool {
        self.operand_count() == 2
    }

    /// Symbol used in the expression syntax (empty for `None` and `Equal`).
    pub const fn symbol(self) -> &'static str {
        match self {
            PortOperator::None | PortOperator::Equal => "",
            PortOperator::NotEqual => "!=",
            PortOperator::LessThan => "<",
            PortOperator::LessOrEqual => "<=",
            PortOperator::GreaterThan => ">",
            PortOperator::GreaterOrEqual => ">=",
            PortOperator::RangeInclusive => ":",
            PortOperator::RangeExclusive => "><",
            PortOperator::RangeExcept => "<>",
        }
    }
}

/// A port number kept in network byte order.
///
/// [`NetworkPort::get`] gives the host-order value, [`NetworkPort::to_network`]
/// the raw big-endian value as a packet filter stores it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub struct NetworkPort(u16);

impl NetworkPort {
    pub const fn new(port: u16) -> Self {
        Self(port.to_be())
    }

    pub const fn get(self) -> u16 {
        u16::from_be(self.0)
    }

    pub const fn to_network(self) -> u16 {
        self.0
    }

    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.get().to_be_bytes()
    }
}

impl From<u16> for NetworkPort {
    fn from(port: u16) -> Self {
        Self::new(port)
    }
}

impl From<NetworkPort> for u16 {
    fn from(port: NetworkPort) -> Self {
        port.get()
    }
}

impl fmt::Debug for NetworkPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl fmt::Display for NetworkPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// A parsed port expression: an operator and its ports.
///
/// Range operators always hold two ports, [`PortOperator::None`] holds none
/// and every other operator holds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PortSpec {
    operator: PortOperator,
    ports: Vec<NetworkPort>,
}

impl PortSpec {
    /// The empty expression: any port.
    pub fn any() -> Self {
        Self::default()
    }

    fn from_parts(operator: PortOperator, ports: &[u16]) -> Self {
        debug_assert_eq!(operator.operand_count(), ports.len());
        Self {
            operator,
            ports: ports.iter().copied().map(NetworkPort::new).collect(),
        }
    }

    pub fn operator(&self) -> PortOperator {
        self.operator
    }

    /// Ports in host byte order.
    pub fn ports(&self) -> Vec<u16> {
        self.ports.iter().map(|p| p.get()).collect()
    }

    /// Ports as stored, in network byte order.
    pub fn network_ports(&self) -> &[NetworkPort] {
        &self.ports
    }

    pub fn is_any(&self) -> bool {
        self.operator == PortOperator::None
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operator.symbol();
        match self.ports.as_slice() {
            [] => Ok(()),
            [port] => write!(f, "{op}{port}"),
            [first, second, ..] => write!(f, "{first}{op}{second}"),
        }
    }
}

impl FromStr for PortSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_port(s)
    }
}

/// Lexical tokens of a port expression.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token<'a> {
    #[regex("[0-9]+", |lex| lex.slice())]
    Number(&'a str),

    #[token("!=")]
    NotEqual,

    /// `!` not followed by `=`
    #[token("!")]
    Bang,

    #[token("<>")]
    Except,

    #[token("<=")]
    LessOrEqual,

    #[token("<")]
    Less,

    #[token("><")]
    Exclusive,

    #[token(">=")]
    GreaterOrEqual,

    #[token(">")]
    Greater,

    #[token(":")]
    Colon,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Number(n) => *n,
            Token::NotEqual => "!=",
            Token::Bang => "!",
            Token::Except => "<>",
            Token::LessOrEqual => "<=",
            Token::Less => "<",
            Token::Exclusive => "><",
            Token::GreaterOrEqual => ">=",
            Token::Greater => ">",
            Token::Colon => ":",
        };
        f.write_str(text)
    }
}

/// Position of the parser within a port expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortState {
    /// Nothing read yet
    Start,
    /// Prefix operator read, waiting for its port
    Prefix(PortOperator),
    /// One bare port read
    Port(u16),
    /// First port and range operator read, waiting for the second port
    Range(u16, PortOperator),
    /// Prefix operator and its port
    Unary(PortOperator, u16),
    /// Both ports of a range
    Binary(PortOperator, u16, u16),
}

impl PortState {
    /// Transition table. `next` is the character right after `token`, used
    /// for the one-character lookahead after a lone `<` or `>`.
    fn step(self, token: Token<'_>, next: Option<char>, input: &str) -> Result<Self, ParseError> {
        use PortOperator as Op;

        let digit_follows = next.is_some_and(|c| c.is_ascii_digit());

        match (self, token) {
            (Self::Start, Token::Number(n)) => Ok(Self::Port(parse_number(n)?)),
            (Self::Start, Token::NotEqual) => Ok(Self::Prefix(Op::NotEqual)),
            (Self::Start, Token::LessOrEqual) => Ok(Self::Prefix(Op::LessOrEqual)),
            (Self::Start, Token::GreaterOrEqual) => Ok(Self::Prefix(Op::GreaterOrEqual)),
            (Self::Start, Token::Less) if digit_follows => Ok(Self::Prefix(Op::LessThan)),
            (Self::Start, Token::Greater) if digit_follows => Ok(Self::Prefix(Op::GreaterThan)),
            (Self::Prefix(op), Token::Number(n)) => Ok(Self::Unary(op, parse_number(n)?)),
            (Self::Port(first), Token::Colon) => Ok(Self::Range(first, Op::RangeInclusive)),
            (Self::Port(first), Token::Exclusive) => Ok(Self::Range(first, Op::RangeExclusive)),
            (Self::Port(first), Token::Except) => Ok(Self::Range(first, Op::RangeExcept)),
            (Self::Range(first, op), Token::Number(n)) => {
                Ok(Self::Binary(op, first, parse_number(n)?))
            }

            // Everything below is an error
            (_, Token::Bang) => Err(ParseError::malformed(input, "expected '=' after '!'")),
            (_, Token::Less | Token::Greater) if !digit_follows => Err(ParseError::malformed(
                input,
                format!("expected port number after '{token}', found {}", describe(next)),
            )),
            (Self::Binary(..), Token::Number(_)) => {
                Err(ParseError::malformed(input, "unexpected extra number"))
            }
            (Self::Port(_) | Self::Unary(..), Token::Number(n)) => Err(ParseError::malformed(
                input,
                format!("unexpected number '{n}' without an operator"),
            )),
            (Self::Prefix(op) | Self::Range(_, op), _) => Err(ParseError::malformed(
                input,
                format!("expected port number after '{}', found '{token}'", op.symbol()),
            )),
            (_, Token::NotEqual) => Err(ParseError::malformed(
                input,
                "'!=' must come before the port number",
            )),
            (Self::Start, Token::Colon | Token::Exclusive | Token::Except) => {
                Err(ParseError::malformed(
                    input,
                    format!("range operator '{token}' needs a port on its left"),
                ))
            }
            (_, _) => Err(ParseError::malformed(input, format!("unexpected '{token}'"))),
        }
    }

    /// Accepts or rejects the state reached at end of input.
    fn finish(self, input: &str) -> Result<PortSpec, ParseError> {
        match self {
            Self::Start => Ok(PortSpec::any()),
            Self::Port(port) => Ok(PortSpec::from_parts(PortOperator::Equal, &[port])),
            Self::Unary(op, port) => Ok(PortSpec::from_parts(op, &[port])),
            Self::Binary(op, first, second) => Ok(PortSpec::from_parts(op, &[first, second])),
            Self::Prefix(op) | Self::Range(_, op) => Err(ParseError::malformed(
                input,
                format!("missing port number after '{}'", op.symbol()),
            )),
        }
    }
}

fn describe(next: Option<char>) -> String {
    match next {
        Some(c) if c.is_whitespace() => "whitespace".to_string(),
        Some(c) => format!("'{c}'"),
        None => "end of input".to_string(),
    }
}

fn parse_number(text: &str) -> Result<u16, ParseError> {
    text.parse().map_err(|_| ParseError::InvalidPort {
        input: text.to_string(),
    })
}

/// Parses a port expression into a [`PortSpec`].
///
/// Whitespace between tokens is ignored, except directly after a lone `<` or
/// `>`, which must be followed by a digit.
///
/// # Errors
///
/// - [`ParseError::InvalidPort`] if a number does not fit in 16 bits.
/// - [`ParseError::MalformedPortExpression`] for anything outside the
///   expression grammar: stray or dangling operators, a lone `!`, a third
///   number, or any other character.
pub fn parse_port(text: &str) -> Result<PortSpec, ParseError> {
    let mut lexer = Token::lexer(text);
    let mut state = PortState::Start;

    while let Some(token) = lexer.next() {
        let token = token.map_err(|()| {
            ParseError::malformed(text, format!("unexpected character '{}'", lexer.slice()))
        })?;
        let next = lexer.remainder().chars().next();
        state = state.step(token, next, text)?;
    }

    let spec = state.finish(text)?;
    debug!("Parsed port expression '{}' as {:?} {:?}", text, spec.operator, spec.ports);

    Ok(spec)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_operator() -> impl Strategy<Value = PortOperator> {
        prop_oneof![
            Just(PortOperator::Equal),
            Just(PortOperator::NotEqual),
            Just(PortOperator::LessThan),
            Just(PortOperator::LessOrEqual),
            Just(PortOperator::GreaterThan),
            Just(PortOperator::GreaterOrEqual),
            Just(PortOperator::RangeInclusive),
            Just(PortOperator::RangeExclusive),
            Just(PortOperator::RangeExcept),
        ]
    }

    proptest! {
        #[test]
        fn test_parse_port_never_panics(input in "\\PC*") {
            let _ = parse_port(&input);
        }

        #[test]
        fn test_grammar_chars_never_panic(input in "[0-9<>!=: ]{0,12}") {
            if let Ok(spec) = parse_port(&input) {
                prop_assert_eq!(spec.ports().len(), spec.operator().operand_count());
            }
        }

        #[test]
        fn test_every_operator_roundtrips(op in arb_operator(), a in any::<u16>(), b in any::<u16>()) {
            let text = if op.is_range() {
                format!("{a}{}{b}", op.symbol())
            } else {
                format!("{}{a}", op.symbol())
            };
            let spec = parse_port(&text).unwrap();
            prop_assert_eq!(spec.operator(), op);
            let expected = if op.is_range() { vec![a, b] } else { vec![a] };
            prop_assert_eq!(spec.ports(), expected);
            prop_assert_eq!(spec.to_string(), text);
        }

        #[test]
        fn test_out_of_range_numbers_rejected(port in 65536u32..=10_000_000) {
            let result = parse_port(&port.to_string());
            let is_invalid_port = matches!(result, Err(ParseError::InvalidPort { .. }));
            prop_assert!(is_invalid_port);
        }
    }
}
