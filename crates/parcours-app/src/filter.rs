// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    Matches,
}

impl CompareOp {
    /// Cycle order used by the filter editor.
    pub const ALL: [Self; 8] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Contains,
        Self::Matches,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Contains => "contains",
            Self::Matches => "matches",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => Some(Self::Eq),
            "!=" | "<>" | "ne" => Some(Self::Ne),
            ">" | "gt" => Some(Self::Gt),
            ">=" | "gte" => Some(Self::Gte),
            "<" | "lt" => Some(Self::Lt),
            "<=" | "lte" => Some(Self::Lte),
            "contains" => Some(Self::Contains),
            "matches" | "~" => Some(Self::Matches),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|op| *op == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Gt | Self::Gte | Self::Lt | Self::Lte)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOp {
    And,
    Or,
    Not,
}

impl LogicOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    Compare {
        field: String,
        op: CompareOp,
        value: String,
    },
    Logic {
        op: LogicOp,
        children: Vec<FilterNode>,
    },
}

/// One node of a filter tree. `enabled` only matters to the editor; the
/// store compiles whatever tree it is handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterNode {
    pub kind: FilterKind,
    pub enabled: bool,
}

impl FilterNode {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Self {
            kind: FilterKind::Compare {
                field: field.into(),
                op,
                value: value.into(),
            },
            enabled: true,
        }
    }

    pub fn logic(op: LogicOp, children: Vec<FilterNode>) -> Self {
        Self {
            kind: FilterKind::Logic { op, children },
            enabled: true,
        }
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        Self::logic(LogicOp::And, children)
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        Self::logic(LogicOp::Or, children)
    }

    pub fn not(child: FilterNode) -> Self {
        Self::logic(LogicOp::Not, vec![child])
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            FilterKind::Compare { field, .. } => {
                if field.trim().is_empty() {
                    bail!("filter comparison is missing a field name");
                }
            }
            FilterKind::Logic { op, children } => {
                if *op == LogicOp::Not && children.len() != 1 {
                    bail!(
                        "NOT takes exactly one child filter, got {}",
                        children.len()
                    );
                }
                for child in children {
                    child.validate()?;
                }
            }
        }
        Ok(())
    }

    /// Every field the tree compares against.
    pub fn fields(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match &self.kind {
            FilterKind::Compare { field, .. } => {
                out.insert(field.as_str());
            }
            FilterKind::Logic { children, .. } => {
                for child in children {
                    child.collect_fields(out);
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            FilterKind::Compare { field, op, value } => {
                format!("{field} {} {value:?}", op.symbol())
            }
            FilterKind::Logic {
                op: LogicOp::Not,
                children,
            } => match children.first() {
                Some(child) => format!("NOT ({})", child.describe()),
                None => "NOT ()".to_owned(),
            },
            FilterKind::Logic { op, children } => children
                .iter()
                .map(|child| match child.kind {
                    FilterKind::Logic { .. } => format!("({})", child.describe()),
                    FilterKind::Compare { .. } => child.describe(),
                })
                .collect::<Vec<_>>()
                .join(&format!(" {} ", op.as_str())),
        }
    }
}

/// Folds the enabled entries into one predicate: none means match
/// everything, a single entry stands alone, several are ANDed in order.
pub fn combine_enabled(entries: &[FilterNode]) -> Option<FilterNode> {
    let mut enabled = entries
        .iter()
        .filter(|entry| entry.enabled)
        .cloned()
        .collect::<Vec<_>>();
    match enabled.len() {
        0 => None,
        1 => enabled.pop(),
        _ => Some(FilterNode::and(enabled)),
    }
}

#[cfg(test)]
mod tests {
    use super::{CompareOp, FilterKind, FilterNode, LogicOp, combine_enabled};

    fn eq(field: &str, value: &str) -> FilterNode {
        FilterNode::compare(field, CompareOp::Eq, value)
    }

    #[test]
    fn combine_with_nothing_enabled_matches_everything() {
        assert_eq!(combine_enabled(&[]), None);
        assert_eq!(
            combine_enabled(&[eq("level", "error").with_enabled(false)]),
            None
        );
    }

    #[test]
    fn combine_with_one_enabled_unwraps_it() {
        let entries = [
            eq("level", "error"),
            eq("service", "api").with_enabled(false),
        ];
        assert_eq!(combine_enabled(&entries), Some(eq("level", "error")));
    }

    #[test]
    fn combine_with_several_enabled_ands_them_in_order() {
        let entries = [
            eq("a", "1"),
            eq("b", "2").with_enabled(false),
            eq("c", "3"),
        ];
        let combined = combine_enabled(&entries).expect("combined filter");
        assert_eq!(
            combined.kind,
            FilterKind::Logic {
                op: LogicOp::And,
                children: vec![eq("a", "1"), eq("c", "3")],
            }
        );
    }

    #[test]
    fn not_requires_exactly_one_child() {
        assert!(FilterNode::not(eq("a", "1")).validate().is_ok());
        let bad = FilterNode::logic(LogicOp::Not, vec![eq("a", "1"), eq("b", "2")]);
        let error = bad.validate().expect_err("two children");
        assert!(error.to_string().contains("exactly one child"));
    }

    #[test]
    fn empty_field_is_rejected() {
        assert!(eq(" ", "x").validate().is_err());
    }

    #[test]
    fn operators_round_trip_through_symbols_and_indexes() {
        for op in CompareOp::ALL {
            assert_eq!(CompareOp::parse(op.symbol()), Some(op));
            assert_eq!(CompareOp::from_index(op.index()), op);
        }
        assert_eq!(CompareOp::parse("GTE"), Some(CompareOp::Gte));
        assert_eq!(CompareOp::parse("like"), None);
    }

    #[test]
    fn fields_and_description_cover_nested_trees() {
        let tree = FilterNode::and(vec![
            eq("level", "error"),
            FilterNode::or(vec![
                eq("service", "api"),
                FilterNode::compare("status", CompareOp::Gte, "500"),
            ]),
        ]);
        assert_eq!(
            tree.fields().into_iter().collect::<Vec<_>>(),
            vec!["level", "service", "status"]
        );
        assert_eq!(
            tree.describe(),
            "level = \"error\" AND (service = \"api\" OR status >= \"500\")"
        );
    }
}
