// dqd-core/src/domain/catalogue/filter.rs

// Parser for the `evaluationFilter` column of the check descriptions.
// Grammar (pandas-eval compatible subset):
//   expr       := and (('|' | 'or') and)*
//   and        := unary (('&' | 'and') unary)*
//   unary      := ('~' | 'not') unary | '(' expr ')' | comparison
//   comparison := operand ('==' | '!=') operand

use thiserror::Error;

use super::element::ElementAttributes;

#[derive(Debug, Error, PartialEq)]
pub enum FilterParseError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),
    #[error("unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token {0}")]
    UnexpectedToken(String),
    #[error("comparison needs one attribute and one literal")]
    InvalidComparison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
}

impl Literal {
    fn matches(&self, value: &str) -> bool {
        match self {
            Literal::Text(text) => value == text,
            Literal::Number(n) => value.trim().parse::<f64>().is_ok_and(|v| v == *n),
        }
    }
}

/// Compiled evaluation predicate over element attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationFilter {
    /// An empty filter selects every element.
    Always,
    Compare {
        attribute: String,
        op: CompareOp,
        literal: Literal,
    },
    Not(Box<EvaluationFilter>),
    And(Box<EvaluationFilter>, Box<EvaluationFilter>),
    Or(Box<EvaluationFilter>, Box<EvaluationFilter>),
}

impl EvaluationFilter {
    pub fn parse(input: &str) -> Result<Self, FilterParseError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Ok(EvaluationFilter::Always);
        }

        let mut parser = Parser { tokens, pos: 0 };
        let filter = parser.parse_or()?;
        match parser.peek() {
            None => Ok(filter),
            Some(tok) => Err(FilterParseError::UnexpectedToken(tok.describe())),
        }
    }

    /// Missing attributes compare as the empty string.
    pub fn matches(&self, attributes: &ElementAttributes) -> bool {
        match self {
            EvaluationFilter::Always => true,
            EvaluationFilter::Compare {
                attribute,
                op,
                literal,
            } => {
                let value = attributes.get(attribute).unwrap_or("");
                match op {
                    CompareOp::Eq => literal.matches(value),
                    CompareOp::Ne => !literal.matches(value),
                }
            }
            EvaluationFilter::Not(inner) => !inner.matches(attributes),
            EvaluationFilter::And(l, r) => l.matches(attributes) && r.matches(attributes),
            EvaluationFilter::Or(l, r) => l.matches(attributes) || r.matches(attributes),
        }
    }
}

// --- LEXER ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Text(String),
    Number(f64),
    Eq,
    Ne,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Text(s) => format!("string '{}'", s),
            Token::Number(n) => format!("number {}", n),
            Token::Eq => "'=='".into(),
            Token::Ne => "'!='".into(),
            Token::And => "'&'".into(),
            Token::Or => "'|'".into(),
            Token::Not => "'~'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, FilterParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '&' => {
                tokens.push(Token::And);
                i += if chars.get(i + 1) == Some(&'&') { 2 } else { 1 };
            }
            '|' => {
                tokens.push(Token::Or);
                i += if chars.get(i + 1) == Some(&'|') { 2 } else { 1 };
            }
            '~' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '\'' | '"' => {
                let start = i;
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or(FilterParseError::UnterminatedString(start))?;
                tokens.push(Token::Text(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                let n = raw
                    .parse::<f64>()
                    .map_err(|_| FilterParseError::UnexpectedChar(c, start))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(FilterParseError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

// --- PARSER ---

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, FilterParseError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(FilterParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    fn parse_or(&mut self) -> Result<EvaluationFilter, FilterParseError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = EvaluationFilter::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<EvaluationFilter, FilterParseError> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = EvaluationFilter::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<EvaluationFilter, FilterParseError> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(EvaluationFilter::Not(Box::new(self.parse_unary()?)))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_or()?;
                match self.next()? {
                    Token::RParen => Ok(inner),
                    other => Err(FilterParseError::UnexpectedToken(other.describe())),
                }
            }
            Some(_) => self.parse_comparison(),
            None => Err(FilterParseError::UnexpectedEnd),
        }
    }

    fn parse_comparison(&mut self) -> Result<EvaluationFilter, FilterParseError> {
        let left = self.next()?;
        let op = match self.next()? {
            Token::Eq => CompareOp::Eq,
            Token::Ne => CompareOp::Ne,
            other => return Err(FilterParseError::UnexpectedToken(other.describe())),
        };
        let right = self.next()?;

        let (attribute, literal) = match (left, right) {
            (Token::Ident(a), lit) | (lit, Token::Ident(a)) => match lit {
                Token::Text(s) => (a, Literal::Text(s)),
                Token::Number(n) => (a, Literal::Number(n)),
                _ => return Err(FilterParseError::InvalidComparison),
            },
            _ => return Err(FilterParseError::InvalidComparison),
        };

        Ok(EvaluationFilter::Compare {
            attribute,
            op,
            literal,
        })
    }
}
