// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property Expressions and Deferred Values
//!
//! A property value is either a literal known at composition time or a
//! placeholder the provisioning engine resolves after the referenced
//! resource exists (a database endpoint address, a load balancer DNS name).
//!
//! ```text
//! Literal                       Deferred
//! ───────                       ────────
//! Str / Int / Bool              Ref(id)           → {"Ref": id}
//! List / Object                 GetAtt(id, attr)  → {"Fn::GetAtt": [id, attr]}
//!                               Join / Select / GetAzs / Base64 / Pseudo
//! ```
//!
//! Placeholders carry the logical ids they depend on, which is what lets the
//! graph reject forward references. `Display` renders placeholders as
//! `${Id.Attribute}` tokens, so interpolated strings stay readable in logs
//! and tests.

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::graph::LogicalId;

/// Pseudo parameters supplied by the provisioning engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoParameter {
    AccountId,
    Region,
    Partition,
    UrlSuffix,
    StackName,
}

impl PseudoParameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountId => "AWS::AccountId",
            Self::Region => "AWS::Region",
            Self::Partition => "AWS::Partition",
            Self::UrlSuffix => "AWS::URLSuffix",
            Self::StackName => "AWS::StackName",
        }
    }
}

/// A property value: literal, or a placeholder resolved during provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<Expr>),
    Object(BTreeMap<String, Expr>),
    /// Physical id of a declared resource or value of a parameter
    Ref(LogicalId),
    /// Attribute of a declared resource, known only after provisioning
    GetAtt { target: LogicalId, attribute: String },
    Join { delimiter: String, parts: Vec<Expr> },
    Select { index: u32, list: Box<Expr> },
    /// Availability zones of the deployment region
    GetAzs,
    Base64(Box<Expr>),
    Pseudo(PseudoParameter),
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn list(items: impl IntoIterator<Item = Expr>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Expr)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn reference(target: &LogicalId) -> Self {
        Self::Ref(target.clone())
    }

    pub fn get_att(target: &LogicalId, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            target: target.clone(),
            attribute: attribute.into(),
        }
    }

    pub fn join(delimiter: impl Into<String>, parts: impl IntoIterator<Item = Expr>) -> Self {
        Self::Join {
            delimiter: delimiter.into(),
            parts: parts.into_iter().collect(),
        }
    }

    /// Concatenate parts, merging adjacent literal strings
    ///
    /// Collapses to a plain `Str` when every part is a literal string, so
    /// interpolation only produces a `Join` when something is deferred.
    pub fn concat(parts: impl IntoIterator<Item = Expr>) -> Self {
        fn push(merged: &mut Vec<Expr>, part: Expr) {
            if let Expr::Str(next) = &part {
                if next.is_empty() {
                    return;
                }
                if let Some(Expr::Str(prev)) = merged.last_mut() {
                    prev.push_str(next);
                    return;
                }
            }
            merged.push(part);
        }

        let mut merged: Vec<Expr> = Vec::new();
        for part in parts {
            match part {
                Expr::Join { delimiter, parts } if delimiter.is_empty() => {
                    for inner in parts {
                        push(&mut merged, inner);
                    }
                }
                other => push(&mut merged, other),
            }
        }

        match merged.len() {
            0 => Expr::Str(String::new()),
            1 if matches!(merged[0], Expr::Str(_)) => merged.remove(0),
            _ => Expr::join("", merged),
        }
    }

    pub fn select(index: u32, list: Expr) -> Self {
        Self::Select {
            index,
            list: Box::new(list),
        }
    }

    pub fn base64(inner: Expr) -> Self {
        Self::Base64(Box::new(inner))
    }

    pub fn pseudo(parameter: PseudoParameter) -> Self {
        Self::Pseudo(parameter)
    }

    /// Whether any part of the value is resolved during provisioning
    pub fn is_deferred(&self) -> bool {
        match self {
            Self::Str(_) | Self::Int(_) | Self::Bool(_) => false,
            Self::List(items) => items.iter().any(Expr::is_deferred),
            Self::Object(entries) => entries.values().any(Expr::is_deferred),
            Self::Join { parts, .. } => parts.iter().any(Expr::is_deferred),
            Self::Select { list, .. } => list.is_deferred(),
            Self::Base64(inner) => inner.is_deferred(),
            Self::Ref(_) | Self::GetAtt { .. } | Self::GetAzs | Self::Pseudo(_) => true,
        }
    }

    /// Logical ids this value depends on, in first-seen order
    pub fn references(&self) -> Vec<&LogicalId> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<&'a LogicalId>) {
        match self {
            Self::Ref(id) | Self::GetAtt { target: id, .. } => {
                if !refs.contains(&id) {
                    refs.push(id);
                }
            }
            Self::List(items) => items.iter().for_each(|e| e.collect_references(refs)),
            Self::Object(entries) => entries.values().for_each(|e| e.collect_references(refs)),
            Self::Join { parts, .. } => parts.iter().for_each(|e| e.collect_references(refs)),
            Self::Select { list, .. } => list.collect_references(refs),
            Self::Base64(inner) => inner.collect_references(refs),
            Self::Str(_) | Self::Int(_) | Self::Bool(_) | Self::GetAzs | Self::Pseudo(_) => {}
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Expr]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key of an `Object` value
    pub fn field(&self, key: &str) -> Option<&Expr> {
        match self {
            Self::Object(entries) => entries.get(key),
            _ => None,
        }
    }

    /// CloudFormation JSON rendering, intrinsic functions included
    pub fn to_cfn(&self) -> Value {
        match self {
            Self::Str(s) => Value::String(s.clone()),
            Self::Int(i) => json!(i),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Expr::to_cfn).collect()),
            Self::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_cfn()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::Ref(id) => json!({ "Ref": id.as_str() }),
            Self::GetAtt { target, attribute } => {
                json!({ "Fn::GetAtt": [target.as_str(), attribute] })
            }
            Self::Join { delimiter, parts } => json!({
                "Fn::Join": [delimiter, parts.iter().map(Expr::to_cfn).collect::<Vec<_>>()]
            }),
            Self::Select { index, list } => json!({ "Fn::Select": [index, list.to_cfn()] }),
            Self::GetAzs => json!({ "Fn::GetAZs": "" }),
            Self::Base64(inner) => json!({ "Fn::Base64": inner.to_cfn() }),
            Self::Pseudo(p) => json!({ "Ref": p.as_str() }),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Object(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Self::Ref(id) => write!(f, "${{{}}}", id),
            Self::GetAtt { target, attribute } => write!(f, "${{{}.{}}}", target, attribute),
            Self::Join { delimiter, parts } => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", delimiter)?;
                    }
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            Self::Select { index, list } => write!(f, "${{Select[{}]({})}}", index, list),
            Self::GetAzs => write!(f, "${{AWS::AZs}}"),
            Self::Base64(inner) => write!(f, "{}", inner),
            Self::Pseudo(p) => write!(f, "${{{}}}", p.as_str()),
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u16> for Expr {
    fn from(value: u16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Expr {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&LogicalId> for Expr {
    fn from(value: &LogicalId) -> Self {
        Self::Ref(value.clone())
    }
}
