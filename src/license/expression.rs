use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Errors produced while parsing a license expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,
}

/// A parsed license expression.
///
/// `WITH` exceptions are kept as part of the license symbol
/// (`gpl-2.0 WITH classpath-exception-2.0`), so they are never split
/// by simplification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LicenseExpr {
    License(String),
    And(Vec<LicenseExpr>),
    Or(Vec<LicenseExpr>),
}

/// Tokens produced by [`tokenize`].
#[derive(Debug, PartialEq, Clone)]
enum Token {
    Id(String),
    And,
    Or,
    With,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Id(id) => write!(f, "{}", id),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::With => write!(f, "WITH"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
        }
    }
}

/// Tokenize a license expression. Operators are case-insensitive
/// (ScanCode writes `mit OR x11`, other tools write `and`/`or`).
fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            chars.next();
        } else if c == ')' {
            tokens.push(Token::RParen);
            chars.next();
        } else {
            let mut s = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '(' || c == ')' {
                    break;
                }
                s.push(c);
                chars.next();
            }
            let token = match s.to_ascii_uppercase().as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                "WITH" => Token::With,
                _ => Token::Id(s),
            };
            tokens.push(token);
        }
    }
    tokens
}

/// Recursive descent parser, AND binds tighter than OR:
/// ```text
/// expr     := or_expr
/// or_expr  := and_expr ( "OR" and_expr )*
/// and_expr := atom ( "AND" atom )*
/// atom     := "(" expr ")" | id ( "WITH" id )?
/// ```
struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_or(&mut self) -> Result<LicenseExpr, ExpressionError> {
        let mut args = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.consume();
            args.push(self.parse_and()?);
        }
        Ok(if args.len() == 1 {
            args.remove(0)
        } else {
            LicenseExpr::Or(args)
        })
    }

    fn parse_and(&mut self) -> Result<LicenseExpr, ExpressionError> {
        let mut args = vec![self.parse_atom()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.consume();
            args.push(self.parse_atom()?);
        }
        Ok(if args.len() == 1 {
            args.remove(0)
        } else {
            LicenseExpr::And(args)
        })
    }

    fn parse_atom(&mut self) -> Result<LicenseExpr, ExpressionError> {
        match self.consume() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.consume() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExpressionError::UnbalancedParenthesis),
                }
            }
            Some(Token::Id(id)) => {
                if matches!(self.peek(), Some(Token::With)) {
                    self.consume();
                    match self.consume() {
                        Some(Token::Id(exception)) => {
                            Ok(LicenseExpr::License(format!("{} WITH {}", id, exception)))
                        }
                        Some(other) => Err(ExpressionError::UnexpectedToken(other.to_string())),
                        None => Err(ExpressionError::UnexpectedEnd),
                    }
                } else {
                    Ok(LicenseExpr::License(id))
                }
            }
            Some(other) => Err(ExpressionError::UnexpectedToken(other.to_string())),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}

impl LicenseExpr {
    /// Parse an expression. An empty or blank string parses to `None`.
    pub fn parse(expr: &str) -> Result<Option<LicenseExpr>, ExpressionError> {
        let tokens = tokenize(expr);
        if tokens.is_empty() {
            return Ok(None);
        }
        let mut parser = ExprParser { tokens, pos: 0 };
        let parsed = parser.parse_or()?;
        match parser.consume() {
            None => Ok(Some(parsed)),
            Some(Token::RParen) => Err(ExpressionError::UnbalancedParenthesis),
            Some(other) => Err(ExpressionError::UnexpectedToken(other.to_string())),
        }
    }

    /// Boolean simplification: flattens nested operators of the same kind,
    /// removes duplicates, applies absorption (`a AND (a OR b)` is `a`,
    /// `a OR (a AND b)` is `a`) and sorts operands.
    pub fn simplify(self) -> LicenseExpr {
        match self {
            LicenseExpr::License(_) => self,
            LicenseExpr::And(args) => simplify_group(args, true),
            LicenseExpr::Or(args) => simplify_group(args, false),
        }
    }

    fn operands(&self) -> Option<&[LicenseExpr]> {
        match self {
            LicenseExpr::License(_) => None,
            LicenseExpr::And(args) | LicenseExpr::Or(args) => Some(args),
        }
    }
}

fn simplify_group(args: Vec<LicenseExpr>, is_and: bool) -> LicenseExpr {
    let mut flat: BTreeSet<LicenseExpr> = BTreeSet::new();
    for arg in args {
        match (arg.simplify(), is_and) {
            (LicenseExpr::And(inner), true) | (LicenseExpr::Or(inner), false) => flat.extend(inner),
            (other, _) => {
                flat.insert(other);
            }
        }
    }

    // absorption: drop a dual group if a sibling operand, or every operand of
    // a sibling dual group, is among its operands
    let absorbed: Vec<LicenseExpr> = flat
        .iter()
        .filter(|candidate| {
            if !is_dual(candidate, is_and) {
                return false;
            }
            let inner = candidate.operands().unwrap_or(&[]);
            flat.iter().any(|other| {
                other != *candidate
                    && match other.operands() {
                        Some(ops) if is_dual(other, is_and) => ops.iter().all(|op| inner.contains(op)),
                        _ => inner.contains(other),
                    }
            })
        })
        .cloned()
        .collect();
    for expr in &absorbed {
        flat.remove(expr);
    }

    let mut args: Vec<LicenseExpr> = flat.into_iter().collect();
    if args.len() == 1 {
        return args.remove(0);
    }
    if is_and {
        LicenseExpr::And(args)
    } else {
        LicenseExpr::Or(args)
    }
}

/// True for an OR group inside an AND (`is_and`), or an AND group inside an OR.
fn is_dual(expr: &LicenseExpr, is_and: bool) -> bool {
    matches!(
        (expr, is_and),
        (LicenseExpr::Or(_), true) | (LicenseExpr::And(_), false)
    )
}

impl fmt::Display for LicenseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseExpr::License(id) => write!(f, "{}", id),
            LicenseExpr::And(args) => write_group(f, args, " AND "),
            LicenseExpr::Or(args) => write_group(f, args, " OR "),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, args: &[LicenseExpr], sep: &str) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match arg {
            LicenseExpr::License(_) => write!(f, "{}", arg)?,
            _ => write!(f, "({})", arg)?,
        }
    }
    Ok(())
}
