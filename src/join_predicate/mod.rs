//! Join predicates and member accessors
//!
//! A join step is described by a two-parameter equality predicate such as
//! `|p, c| p.category_id == c.category_id`. The predicate is either parsed from
//! closure text or built directly with [`JoinPredicate::on`]; both produce the
//! same [`Lambda`] tree, from which the key extractor pulls one field name per
//! side.
//!
//! Single-parameter accessors (`|p| p.unit_price`) used for sorting, aggregate
//! columns and grouping are represented by [`FieldRef`].

mod ast;
mod errors;
mod parser;

use std::fmt;
use std::marker::PhantomData;

use crate::entity_catalog::{ColumnInfo, Entity, EntityMetadata, EntityType};
use crate::errors::{SynthesisError, SynthesisResult};

pub use ast::{BinaryOp, Lambda, PredicateExpr};
pub use errors::PredicateParseError;
pub use parser::parse_lambda;

/// Which operand of a predicate a diagnostic refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateSide {
    Left,
    Right,
    /// The predicate as a whole (shape, parameter count, syntax)
    Whole,
}

impl PredicateSide {
    fn index(&self) -> Option<usize> {
        match self {
            PredicateSide::Left => Some(0),
            PredicateSide::Right => Some(1),
            PredicateSide::Whole => None,
        }
    }
}

impl fmt::Display for PredicateSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateSide::Left => f.write_str("left"),
            PredicateSide::Right => f.write_str("right"),
            PredicateSide::Whole => f.write_str("whole"),
        }
    }
}

/// Field name referenced by one side of an equality predicate.
///
/// The side may be wrapped in a single coercion (`p.id as i64`); anything
/// deeper, or anything that is not a field of that side's own parameter, is
/// rejected with `MalformedJoinPredicate`.
pub fn extract_key(predicate: &Lambda, side: PredicateSide) -> SynthesisResult<String> {
    let Some(index) = side.index() else {
        return Err(SynthesisError::malformed_predicate(
            side,
            &predicate.text,
            "a key can only be extracted from the left or right side",
        ));
    };

    if predicate.parameters.len() != 2 {
        return Err(SynthesisError::malformed_predicate(
            PredicateSide::Whole,
            &predicate.text,
            format!(
                "expected exactly two parameters, found {}",
                predicate.parameters.len()
            ),
        ));
    }

    let (left, right) = match &predicate.body {
        PredicateExpr::Binary {
            op: BinaryOp::Eq,
            left,
            right,
        } => (left, right),
        _ => {
            return Err(SynthesisError::malformed_predicate(
                PredicateSide::Whole,
                &predicate.text,
                "expression body is not a binary equality",
            ))
        }
    };

    let operand = if index == 0 { left } else { right };
    let parameter = &predicate.parameters[index];
    field_of_parameter(operand, parameter).ok_or_else(|| {
        SynthesisError::malformed_predicate(
            side,
            &predicate.text,
            format!(
                "expected a field access on parameter '{}', found '{}'",
                parameter, operand
            ),
        )
    })
}

/// Field name of a single-parameter member accessor such as `|p| p.unit_price`.
pub fn extract_member_name(accessor: &Lambda) -> SynthesisResult<String> {
    if accessor.parameters.len() != 1 {
        return Err(SynthesisError::malformed_predicate(
            PredicateSide::Whole,
            &accessor.text,
            format!(
                "member accessor takes exactly one parameter, found {}",
                accessor.parameters.len()
            ),
        ));
    }
    field_of_parameter(&accessor.body, &accessor.parameters[0]).ok_or_else(|| {
        SynthesisError::malformed_predicate(
            PredicateSide::Whole,
            &accessor.text,
            "member accessor body is not a field access",
        )
    })
}

fn field_of_parameter(expr: &PredicateExpr, parameter: &str) -> Option<String> {
    match expr.unwrap_convert() {
        PredicateExpr::Field {
            parameter: owner,
            field,
        } if owner == parameter => Some(field.clone()),
        _ => None,
    }
}

/// Typed two-parameter equality predicate between entity `L` and entity `R`.
pub struct JoinPredicate<L, R> {
    lambda: Lambda,
    _entities: PhantomData<fn() -> (L, R)>,
}

impl<L: Entity, R: Entity> JoinPredicate<L, R> {
    /// Parses closure text. Syntax errors surface as `MalformedJoinPredicate`.
    pub fn parse(text: &str) -> SynthesisResult<Self> {
        let lambda = parse_lambda(text).map_err(|e| {
            SynthesisError::malformed_predicate(PredicateSide::Whole, text, e.to_string())
        })?;
        Ok(Self::from_lambda(lambda))
    }

    /// `left.left_field == right.right_field`
    pub fn on(left_field: &str, right_field: &str) -> Self {
        let body = PredicateExpr::binary(
            BinaryOp::Eq,
            PredicateExpr::field("l", left_field),
            PredicateExpr::field("r", right_field),
        );
        Self::from_lambda(Lambda::new(vec!["l".to_string(), "r".to_string()], body))
    }

    pub fn from_lambda(lambda: Lambda) -> Self {
        Self {
            lambda,
            _entities: PhantomData,
        }
    }

    pub fn lambda(&self) -> &Lambda {
        &self.lambda
    }

    pub fn key(&self, side: PredicateSide) -> SynthesisResult<String> {
        extract_key(&self.lambda, side)
    }

    /// Entity type behind one side; the side must also be a valid key access.
    pub fn key_type(&self, side: PredicateSide) -> SynthesisResult<EntityType> {
        self.key(side)?;
        match side {
            PredicateSide::Left => Ok(EntityType::of::<L>()),
            PredicateSide::Right => Ok(EntityType::of::<R>()),
            PredicateSide::Whole => Err(SynthesisError::malformed_predicate(
                side,
                &self.lambda.text,
                "a key type can only be extracted from the left or right side",
            )),
        }
    }
}

impl<L, R> fmt::Debug for JoinPredicate<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JoinPredicate").field(&self.lambda.text).finish()
    }
}

impl<L, R> Clone for JoinPredicate<L, R> {
    fn clone(&self) -> Self {
        Self {
            lambda: self.lambda.clone(),
            _entities: PhantomData,
        }
    }
}

/// Reference to one field of entity `T`.
pub struct FieldRef<T> {
    field: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> FieldRef<T> {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            _entity: PhantomData,
        }
    }

    /// Parses an accessor closure like `|p| p.unit_price`.
    pub fn parse(text: &str) -> SynthesisResult<Self> {
        let lambda = parse_lambda(text).map_err(|e| {
            SynthesisError::malformed_predicate(PredicateSide::Whole, text, e.to_string())
        })?;
        Ok(Self::new(extract_member_name(&lambda)?))
    }

    pub fn name(&self) -> &str {
        &self.field
    }

    pub fn resolve<'m>(&self, metadata: &'m EntityMetadata) -> SynthesisResult<&'m ColumnInfo> {
        metadata.require_column_for_field(&self.field)
    }
}

impl<T> fmt::Debug for FieldRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldRef").field(&self.field).finish()
    }
}

impl<T> Clone for FieldRef<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            _entity: PhantomData,
        }
    }
}
