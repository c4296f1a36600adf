//! Condition algebra: leaf predicates over columns or JSON paths, joined by AND.

use crate::error::Result;
use crate::schema::{FieldTarget, Schema, SchemaField};
use crate::sql::expr::{param, Expr, ExprExt};
use crate::value::Value;

/// Ordered comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ScalarOp {
    fn apply(self, left: Expr, right: Expr) -> Expr {
        match self {
            ScalarOp::Eq => left.eq(right),
            ScalarOp::Gt => left.gt(right),
            ScalarOp::Gte => left.gte(right),
            ScalarOp::Lt => left.lt(right),
            ScalarOp::Lte => left.lte(right),
        }
    }
}

/// A query predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq {
        field: SchemaField,
        value: Value,
    },
    /// Set membership. No values means no restriction.
    In {
        field: SchemaField,
        values: Vec<Value>,
    },
    Cmp {
        op: ScalarOp,
        field: SchemaField,
        value: Value,
    },
    And(Vec<Condition>),
}

impl Condition {
    pub fn eq(field: impl Into<SchemaField>, value: impl Into<Value>) -> Self {
        Condition::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(
        field: impl Into<SchemaField>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cmp(op: ScalarOp, field: impl Into<SchemaField>, value: impl Into<Value>) -> Self {
        Condition::Cmp {
            op,
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gt(field: impl Into<SchemaField>, value: impl Into<Value>) -> Self {
        Self::cmp(ScalarOp::Gt, field, value)
    }

    pub fn gte(field: impl Into<SchemaField>, value: impl Into<Value>) -> Self {
        Self::cmp(ScalarOp::Gte, field, value)
    }

    pub fn lt(field: impl Into<SchemaField>, value: impl Into<Value>) -> Self {
        Self::cmp(ScalarOp::Lt, field, value)
    }

    pub fn lte(field: impl Into<SchemaField>, value: impl Into<Value>) -> Self {
        Self::cmp(ScalarOp::Lte, field, value)
    }

    /// Conjunction; nested conjunctions are flattened.
    pub fn and(self, other: Condition) -> Self {
        let mut terms = match self {
            Condition::And(terms) => terms,
            leaf => vec![leaf],
        };
        match other {
            Condition::And(more) => terms.extend(more),
            leaf => terms.push(leaf),
        }
        Condition::And(terms)
    }

    /// Every field the condition refers to.
    pub fn fields(&self) -> Vec<&SchemaField> {
        match self {
            Condition::Eq { field, .. }
            | Condition::In { field, .. }
            | Condition::Cmp { field, .. } => vec![field],
            Condition::And(terms) => terms.iter().flat_map(|t| t.fields()).collect(),
        }
    }

    /// Validate against `schema` and compile to a WHERE expression.
    ///
    /// Returns `None` for conditions that do not restrict anything.
    pub fn to_expr<R>(&self, schema: &Schema<R>) -> Result<Option<Expr>> {
        match self {
            Condition::Eq { field, value } => {
                leaf(schema, field, |target| target.eq(param(value.clone()))).map(Some)
            }
            Condition::Cmp { op, field, value } => {
                leaf(schema, field, |target| op.apply(target, param(value.clone()))).map(Some)
            }
            Condition::In { field, values } => {
                // Still validated, so a misspelled field fails even when unused.
                schema.validate(field)?;
                if values.is_empty() {
                    return Ok(None);
                }
                leaf(schema, field, |target| {
                    target.in_list(values.iter().cloned().map(param).collect())
                })
                .map(Some)
            }
            Condition::And(terms) => {
                let mut combined: Option<Expr> = None;
                for term in terms {
                    if let Some(expr) = term.to_expr(schema)? {
                        combined = Some(match combined {
                            Some(existing) => existing.and(expr),
                            None => expr,
                        });
                    }
                }
                Ok(combined)
            }
        }
    }
}

fn leaf<R>(
    schema: &Schema<R>,
    field: &SchemaField,
    predicate: impl FnOnce(Expr) -> Expr,
) -> Result<Expr> {
    Ok(match schema.target(field)? {
        FieldTarget::Value(expr) => predicate(expr),
        FieldTarget::Each {
            base,
            array_path,
            element,
        } => Expr::AnyElement {
            base: Box::new(base),
            array_path,
            predicate: Box::new(predicate(element)),
        },
    })
}
