// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Filter trees to SQL. Identifiers are checked against the schema and
//! quoted; every literal is bound as a parameter.

use crate::load::normalize_timestamp;
use anyhow::{Context, Result, anyhow, bail};
use parcours_app::{CompareOp, Field, FieldKind, FilterKind, FilterNode, LogicOp, Sort};
use regex::Regex;
use rusqlite::types::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub clause: String,
    pub params: Vec<Value>,
}

/// Compiles a filter tree. `None` means the tree places no constraint.
pub fn compile(filter: &FilterNode, fields: &[Field]) -> Result<Option<Predicate>> {
    filter.validate()?;
    let mut params = Vec::new();
    let clause = compile_node(filter, fields, &mut params)?;
    Ok(clause.map(|clause| Predicate { clause, params }))
}

pub fn order_by(sorts: &[Sort], fields: &[Field]) -> Result<String> {
    let mut terms = Vec::with_capacity(sorts.len() + 1);
    for sort in sorts {
        let field = lookup(fields, &sort.field)?;
        let direction = if sort.descending { "DESC" } else { "ASC" };
        terms.push(format!("{} {direction}", quote_identifier(&field.name)));
    }
    terms.push("\"id\" ASC".to_owned());
    Ok(terms.join(", "))
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Field names that may become columns: ASCII letters, digits and
/// underscores, not starting with a digit.
pub fn is_field_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    matches!(bytes.next(), Some(first) if first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

fn compile_node(
    node: &FilterNode,
    fields: &[Field],
    params: &mut Vec<Value>,
) -> Result<Option<String>> {
    match &node.kind {
        FilterKind::Compare { field, op, value } => {
            let field = lookup(fields, field)?;
            compile_compare(field, *op, value, params).map(Some)
        }
        FilterKind::Logic {
            op: LogicOp::Not,
            children,
        } => {
            let child = children
                .first()
                .ok_or_else(|| anyhow!("NOT takes exactly one child filter"))?;
            Ok(compile_node(child, fields, params)?.map(|clause| format!("NOT ({clause})")))
        }
        FilterKind::Logic { op, children } => {
            let mut clauses = Vec::with_capacity(children.len());
            for child in children {
                if let Some(clause) = compile_node(child, fields, params)? {
                    clauses.push(format!("({clause})"));
                }
            }
            if clauses.is_empty() {
                return Ok(None);
            }
            Ok(Some(clauses.join(&format!(" {} ", op.as_str()))))
        }
    }
}

fn compile_compare(
    field: &Field,
    op: CompareOp,
    literal: &str,
    params: &mut Vec<Value>,
) -> Result<String> {
    let column = quote_identifier(&field.name);
    let clause = match op {
        CompareOp::Contains => {
            params.push(Value::Text(literal.to_owned()));
            format!("instr({column}, ?) > 0")
        }
        CompareOp::Matches => {
            Regex::new(literal).with_context(|| format!("invalid pattern {literal:?}"))?;
            params.push(Value::Text(literal.to_owned()));
            format!("regexp(?, {column})")
        }
        _ => {
            let symbol = op.symbol();
            match bind_literal(field.kind, op, literal) {
                Bound::Plain(value) => {
                    params.push(value);
                    format!("{column} {symbol} ?")
                }
                Bound::Numeric(value) => {
                    params.push(Value::Real(value));
                    format!("CAST({column} AS REAL) {symbol} ?")
                }
            }
        }
    };
    Ok(clause)
}

enum Bound {
    Plain(Value),
    /// Ordering against a numeric literal on a text column.
    Numeric(f64),
}

fn bind_literal(kind: FieldKind, op: CompareOp, literal: &str) -> Bound {
    let trimmed = literal.trim();
    match kind {
        FieldKind::Integer => {
            if let Ok(value) = trimmed.parse::<i64>() {
                return Bound::Plain(Value::Integer(value));
            }
            if let Ok(value) = trimmed.parse::<f64>() {
                return Bound::Plain(Value::Real(value));
            }
        }
        FieldKind::Real => {
            if let Ok(value) = trimmed.parse::<f64>() {
                return Bound::Plain(Value::Real(value));
            }
        }
        FieldKind::Timestamp => {
            if let Some(normalized) = OffsetDateTime::parse(trimmed, &Rfc3339)
                .ok()
                .and_then(normalize_timestamp)
            {
                return Bound::Plain(Value::Text(normalized));
            }
        }
        FieldKind::Text | FieldKind::Other => {
            if op.is_ordering()
                && let Ok(value) = trimmed.parse::<f64>()
            {
                return Bound::Numeric(value);
            }
        }
    }
    Bound::Plain(Value::Text(literal.to_owned()))
}

fn lookup<'a>(fields: &'a [Field], name: &str) -> Result<&'a Field> {
    if !is_field_name(name) {
        bail!("invalid field name {name:?}");
    }
    fields
        .iter()
        .find(|field| field.name == name)
        .ok_or_else(|| anyhow!("unknown field {name}; add it to the layout so it gets promoted"))
}

#[cfg(test)]
mod tests {
    use super::{compile, is_field_name, order_by, quote_identifier};
    use parcours_app::{CompareOp, Field, FieldKind, FilterNode, Sort};
    use rusqlite::types::Value;

    fn fields() -> Vec<Field> {
        vec![
            Field::new("id", FieldKind::Integer),
            Field::new("timestamp", FieldKind::Timestamp),
            Field::new("level", FieldKind::Text),
            Field::new("status", FieldKind::Text),
        ]
    }

    #[test]
    fn equality_binds_the_literal() {
        let predicate = compile(
            &FilterNode::compare("level", CompareOp::Eq, "it's"),
            &fields(),
        )
        .expect("compile")
        .expect("clause");
        assert_eq!(predicate.clause, "\"level\" = ?");
        assert_eq!(predicate.params, vec![Value::Text("it's".to_owned())]);
    }

    #[test]
    fn nested_logic_is_parenthesized_in_order() {
        let tree = FilterNode::and(vec![
            FilterNode::compare("level", CompareOp::Ne, "debug"),
            FilterNode::not(FilterNode::or(vec![
                FilterNode::compare("level", CompareOp::Contains, "warn"),
                FilterNode::compare("level", CompareOp::Matches, "^err"),
            ])),
        ]);
        let predicate = compile(&tree, &fields()).expect("compile").expect("clause");
        assert_eq!(
            predicate.clause,
            "(\"level\" != ?) AND (NOT ((instr(\"level\", ?) > 0) OR (regexp(?, \"level\"))))"
        );
        assert_eq!(predicate.params.len(), 3);
    }

    #[test]
    fn numeric_ordering_on_text_casts() {
        let predicate = compile(
            &FilterNode::compare("status", CompareOp::Gte, "500"),
            &fields(),
        )
        .expect("compile")
        .expect("clause");
        assert_eq!(predicate.clause, "CAST(\"status\" AS REAL) >= ?");
        assert_eq!(predicate.params, vec![Value::Real(500.0)]);
    }

    #[test]
    fn integer_fields_bind_integers() {
        let predicate = compile(&FilterNode::compare("id", CompareOp::Lt, "10"), &fields())
            .expect("compile")
            .expect("clause");
        assert_eq!(predicate.params, vec![Value::Integer(10)]);
    }

    #[test]
    fn timestamp_literals_are_normalized() {
        let predicate = compile(
            &FilterNode::compare("timestamp", CompareOp::Gt, "2026-02-19T13:00:00+01:00"),
            &fields(),
        )
        .expect("compile")
        .expect("clause");
        assert_eq!(
            predicate.params,
            vec![Value::Text("2026-02-19T12:00:00.000000Z".to_owned())]
        );
    }

    #[test]
    fn unknown_and_invalid_fields_are_rejected() {
        let unknown = compile(
            &FilterNode::compare("service", CompareOp::Eq, "api"),
            &fields(),
        )
        .expect_err("unknown");
        assert!(unknown.to_string().contains("unknown field service"));

        let invalid = compile(
            &FilterNode::compare("level\"; DROP", CompareOp::Eq, "x"),
            &fields(),
        )
        .expect_err("invalid");
        assert!(invalid.to_string().contains("invalid field name"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let error = compile(
            &FilterNode::compare("level", CompareOp::Matches, "("),
            &fields(),
        )
        .expect_err("bad regex");
        assert!(error.to_string().contains("invalid pattern"));
    }

    #[test]
    fn empty_logic_places_no_constraint() {
        assert_eq!(compile(&FilterNode::and(Vec::new()), &fields()).expect("compile"), None);
    }

    #[test]
    fn order_by_appends_id_tiebreak() {
        assert_eq!(order_by(&[], &fields()).expect("order"), "\"id\" ASC");
        assert_eq!(
            order_by(&[Sort::descending("timestamp")], &fields()).expect("order"),
            "\"timestamp\" DESC, \"id\" ASC"
        );
        assert!(order_by(&[Sort::ascending("nope")], &fields()).is_err());
    }

    #[test]
    fn field_names_and_quoting() {
        assert!(is_field_name("request_id"));
        assert!(is_field_name("_x1"));
        assert!(!is_field_name("1abc"));
        assert!(!is_field_name("a-b"));
        assert!(!is_field_name(""));
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
