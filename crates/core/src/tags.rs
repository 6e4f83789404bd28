//! 시나리오 필터 — 태그 표현식과 이름 정규식
//!
//! 태그 표현식 문법 (우선순위: `not` > `and` > `or`):
//! ```text
//! expr    := or
//! or      := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not" unary | primary
//! primary := "@tag" | "(" expr ")"
//! ```
//!
//! 설정된 태그 표현식은 모두 만족해야 하고, 이름 정규식은 하나라도 일치하면 됩니다.

use std::fmt;

use regex::Regex;

use crate::config::{EffectiveOptions, FILTER_NAME_PROPERTY, FILTER_TAGS_PROPERTY};
use crate::error::ConfigError;

/// 파싱된 태그 표현식
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagExpression {
    Tag(String),
    Not(Box<TagExpression>),
    And(Box<TagExpression>, Box<TagExpression>),
    Or(Box<TagExpression>, Box<TagExpression>),
}

impl TagExpression {
    /// 태그 표현식 문자열을 파싱합니다.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(invalid_tags(input, "empty expression"));
        }
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(invalid_tags(input, &format!("unexpected token '{token}'")));
        }
        Ok(expr)
    }

    /// 태그 집합이 표현식을 만족하는지 평가합니다.
    pub fn evaluate<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        match self {
            Self::Tag(tag) => tags.iter().any(|t| t.as_ref() == tag),
            Self::Not(inner) => !inner.evaluate(tags),
            Self::And(left, right) => left.evaluate(tags) && right.evaluate(tags),
            Self::Or(left, right) => left.evaluate(tags) || right.evaluate(tags),
        }
    }
}

impl fmt::Display for TagExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Not(inner) => write!(f, "not ({inner})"),
            Self::And(left, right) => write!(f, "({left} and {right})"),
            Self::Or(left, right) => write!(f, "({left} or {right})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.write_str(tag),
            Self::Not => f.write_str("not"),
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
            Self::Open => f.write_str("("),
            Self::Close => f.write_str(")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
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
            _ => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let word = &input[start..end];
                let token = match word {
                    "not" => Token::Not,
                    "and" => Token::And,
                    "or" => Token::Or,
                    tag if tag.starts_with('@') && tag.len() > 1 => Token::Tag(tag.to_owned()),
                    other => {
                        return Err(invalid_tags(
                            input,
                            &format!("'{other}' is not a tag (tags start with '@')"),
                        ));
                    }
                };
                tokens.push(token);
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_or(&mut self) -> Result<TagExpression, ConfigError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = TagExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<TagExpression, ConfigError> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = TagExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<TagExpression, ConfigError> {
        match self.next() {
            Some(Token::Not) => Ok(TagExpression::Not(Box::new(self.parse_unary()?))),
            Some(Token::Tag(tag)) => Ok(TagExpression::Tag(tag)),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(invalid_tags(self.input, "missing closing ')'")),
                }
            }
            Some(token) => Err(invalid_tags(
                self.input,
                &format!("unexpected token '{token}'"),
            )),
            None => Err(invalid_tags(self.input, "unexpected end of expression")),
        }
    }
}

fn invalid_tags(input: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: FILTER_TAGS_PROPERTY.to_owned(),
        reason: format!("'{input}': {reason}"),
    }
}

/// 시나리오 선택 필터
#[derive(Debug, Clone, Default)]
pub struct Filters {
    tags: Vec<TagExpression>,
    names: Vec<Regex>,
    limit: Option<usize>,
}

impl Filters {
    /// 최종 옵션에서 필터를 만듭니다. 표현식이나 정규식이 잘못되면 에러를 반환합니다.
    pub fn from_options(options: &EffectiveOptions) -> Result<Self, ConfigError> {
        let tags = options
            .tag_expressions
            .iter()
            .map(|expr| TagExpression::parse(expr))
            .collect::<Result<Vec<_>, _>>()?;
        let names = options
            .name_filters
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                    field: FILTER_NAME_PROPERTY.to_owned(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tags,
            names,
            limit: options.limit,
        })
    }

    /// 이름과 태그가 모든 필터를 통과하는지 확인합니다.
    pub fn accepts<S: AsRef<str>>(&self, name: &str, tags: &[S]) -> bool {
        self.tags.iter().all(|expr| expr.evaluate(tags))
            && (self.names.is_empty() || self.names.iter().any(|re| re.is_match(name)))
    }

    /// 전체 실행에서 선택할 최대 시나리오 수
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.names.is_empty() && self.limit.is_none()
    }
}
