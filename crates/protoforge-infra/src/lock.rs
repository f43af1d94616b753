//! Lock-string evaluation.
//!
//! A lock string is a `;`-separated list of `access_type:expression`
//! entries, e.g. `spawn:all(); edit:id(5) or perm(Admin)`. Expressions are
//! lock-function calls combined with `and`, `or` and `not`; `and` binds
//! tighter than `or`.

use protoforge_core::service::lock::LockChecker;
use protoforge_types::object::Caller;

/// Permission hierarchy, lowest first. Holding a permission grants every
/// permission below it.
const PERMISSION_HIERARCHY: &[&str] = &["player", "helper", "builder", "admin", "developer"];

const LOCK_FUNCS: &[&str] = &["all", "none", "true", "false", "id", "dbref", "perm", "superuser"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Args(Vec<String>),
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Call { name: String, args: Vec<String> },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '(' {
            chars.next();
            let mut inner = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == ')' {
                    closed = true;
                    break;
                }
                inner.push(c);
            }
            if !closed {
                return Err(format!("unclosed '(' in '{input}'"));
            }
            let args = inner
                .split(',')
                .map(|a| a.trim().trim_matches(['\'', '"']).to_string())
                .filter(|a| !a.is_empty())
                .collect();
            tokens.push(Token::Args(args));
        } else if c.is_alphanumeric() || c == '_' {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &input[start..end];
            tokens.push(match word.to_lowercase().as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                _ => Token::Ident(word.to_string()),
            });
        } else {
            return Err(format!("unexpected '{c}' in '{input}'"));
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse(input: &str) -> Result<Expr, String> {
        let mut parser = Parser {
            tokens: tokenize(input)?,
            pos: 0,
        };
        if parser.tokens.is_empty() {
            return Err("empty lock expression".to_string());
        }
        let expr = parser.or_expr()?;
        if parser.pos < parser.tokens.len() {
            return Err(format!("unexpected trailing input in '{input}'"));
        }
        Ok(expr)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            lhs = Expr::Or(Box::new(lhs), Box::new(self.and_expr()?));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.not_expr()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            lhs = Expr::And(Box::new(lhs), Box::new(self.not_expr()?));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Not) => Ok(Expr::Not(Box::new(self.not_expr()?))),
            Some(Token::Ident(name)) => match self.next() {
                Some(Token::Args(args)) => {
                    let name = name.to_lowercase();
                    if !LOCK_FUNCS.contains(&name.as_str()) {
                        return Err(format!("lock-function '{name}' is not available"));
                    }
                    Ok(Expr::Call { name, args })
                }
                _ => Err(format!("expected '(' after '{name}'")),
            },
            Some(other) => Err(format!("unexpected {other:?}")),
            None => Err("lock expression ended early".to_string()),
        }
    }
}

fn permission_rank(perm: &str) -> Option<usize> {
    let perm = perm.trim().to_lowercase();
    let singular = perm.strip_suffix('s').unwrap_or(&perm);
    PERMISSION_HIERARCHY
        .iter()
        .position(|p| *p == perm || *p == singular)
}

fn has_permission(caller: &Caller, required: &str) -> bool {
    match permission_rank(required) {
        Some(needed) => caller
            .permissions
            .iter()
            .filter_map(|p| permission_rank(p))
            .any(|held| held >= needed),
        None => caller
            .permissions
            .iter()
            .any(|p| p.eq_ignore_ascii_case(required.trim())),
    }
}

fn matches_id(caller: &Caller, args: &[String]) -> bool {
    args.first()
        .and_then(|a| a.trim_start_matches('#').parse::<i64>().ok())
        .is_some_and(|id| id == caller.id)
}

fn eval(expr: &Expr, caller: &Caller) -> bool {
    match expr {
        Expr::Call { name, args } => match name.as_str() {
            "all" | "true" => true,
            "none" | "false" => false,
            "id" | "dbref" => matches_id(caller, args),
            "perm" => args.first().is_some_and(|p| has_permission(caller, p)),
            "superuser" => caller.superuser,
            _ => false,
        },
        Expr::Not(inner) => !eval(inner, caller),
        Expr::And(a, b) => eval(a, caller) && eval(b, caller),
        Expr::Or(a, b) => eval(a, caller) || eval(b, caller),
    }
}

/// Split a lock string into `(access_type, expression)` pairs.
fn entries(lockstring: &str) -> Result<Vec<(String, &str)>, String> {
    lockstring
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (access, expr) = part
                .split_once(':')
                .ok_or_else(|| format!("Lock: '{part}' has no access_type:definition."))?;
            let access = access.trim().to_lowercase();
            if access.is_empty() {
                return Err(format!("Lock: '{part}' has no access_type:definition."));
            }
            Ok((access, expr.trim()))
        })
        .collect()
}

/// `LockChecker` for the lock-string language above.
///
/// Superusers pass every check. An empty lock string grants access; a lock
/// string without an entry for the requested access type denies it. When an
/// access type appears more than once, the last entry wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct LockStringEvaluator;

impl LockStringEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl LockChecker for LockStringEvaluator {
    fn check(&self, caller: &Caller, lockstring: &str, access_type: &str) -> bool {
        if caller.superuser || lockstring.trim().is_empty() {
            return true;
        }
        let entries = match entries(lockstring) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(lockstring, "unparsable lock string: {err}");
                return false;
            }
        };
        let access_type = access_type.to_lowercase();
        let Some((_, expr)) = entries.iter().rev().find(|(access, _)| *access == access_type) else {
            return false;
        };
        match Parser::parse(expr) {
            Ok(expr) => eval(&expr, caller),
            Err(err) => {
                tracing::warn!(lockstring, "unparsable lock expression: {err}");
                false
            }
        }
    }

    fn validate(&self, lockstring: &str) -> Result<(), String> {
        for (access, expr) in entries(lockstring)? {
            Parser::parse(expr).map_err(|e| format!("Lock: {access}: {e}."))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: i64, perms: &[&str]) -> Caller {
        Caller {
            permissions: perms.iter().map(|p| p.to_string()).collect(),
            ..Caller::new(id, "tester")
        }
    }

    const LOCKS: &str = "spawn:all(); edit:id(5) or perm(Admin)";

    #[test]
    fn test_all_and_id() {
        let eval = LockStringEvaluator::new();
        let owner = caller(5, &[]);
        let stranger = caller(6, &[]);

        assert!(eval.check(&stranger, LOCKS, "spawn"));
        assert!(eval.check(&owner, LOCKS, "edit"));
        assert!(!eval.check(&stranger, LOCKS, "edit"));
    }

    #[test]
    fn test_perm_hierarchy() {
        let eval = LockStringEvaluator::new();
        assert!(eval.check(&caller(9, &["Developer"]), LOCKS, "edit"));
        assert!(eval.check(&caller(9, &["admins"]), LOCKS, "edit"));
        assert!(!eval.check(&caller(9, &["Builder"]), LOCKS, "edit"));
    }

    #[test]
    fn test_missing_access_type_denies() {
        let eval = LockStringEvaluator::new();
        assert!(!eval.check(&caller(5, &[]), LOCKS, "delete"));
    }

    #[test]
    fn test_empty_lockstring_allows() {
        let eval = LockStringEvaluator::new();
        assert!(eval.check(&caller(1, &[]), "", "edit"));
        assert!(eval.check(&caller(1, &[]), "  ", "spawn"));
    }

    #[test]
    fn test_superuser_bypasses() {
        let eval = LockStringEvaluator::new();
        let mut root = caller(1, &[]);
        root.superuser = true;
        assert!(eval.check(&root, "edit:none()", "edit"));
        assert!(eval.check(&root, "spawn:all()", "delete"));
    }

    #[test]
    fn test_not_and_precedence() {
        let eval = LockStringEvaluator::new();
        let builder = caller(3, &["Builder"]);
        assert!(eval.check(&builder, "get:not id(4)", "get"));
        assert!(!eval.check(&builder, "get:not perm(Builder)", "get"));
        // and binds tighter than or
        assert!(eval.check(&builder, "get:none() and id(4) or dbref(#3)", "get"));
        assert!(!eval.check(&builder, "get:id(3) and perm(Admin)", "get"));
    }

    #[test]
    fn test_last_entry_wins() {
        let eval = LockStringEvaluator::new();
        assert!(!eval.check(&caller(1, &[]), "edit:all(); edit:none()", "edit"));
    }

    #[test]
    fn test_validate() {
        let eval = LockStringEvaluator::new();
        assert!(eval.validate(LOCKS).is_ok());
        assert!(eval.validate("").is_ok());
        assert!(eval.validate("spawn:all();").is_ok());

        let err = eval.validate("all()").unwrap_err();
        assert!(err.contains("has no access_type"));

        let err = eval.validate("edit:frobnicate(1)").unwrap_err();
        assert!(err.contains("'frobnicate' is not available"));

        assert!(eval.validate("edit:id(1) or").is_err());
        assert!(eval.validate("edit:id(1").is_err());
    }

    #[test]
    fn test_invalid_lock_denies() {
        let eval = LockStringEvaluator::new();
        assert!(!eval.check(&caller(1, &[]), "edit:bogus(", "edit"));
    }
}
