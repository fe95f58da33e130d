//! Union resolution.
//!
//! Smart unions run a strict pass over every member before any lax pass,
//! so an exact type match always beats a coercion regardless of member
//! order; declaration order breaks ties within a pass. Tagged unions read
//! the tag first and descend into exactly one branch.

use crate::errors::{ErrorKind, PathSeg, ValError};
use crate::schema::{Discriminator, NodeId, UnionMode};
use crate::value::Value;

use super::validator::{Runner, ValState};

impl Runner<'_> {
    pub(super) fn run_union(
        &self,
        members: &[(String, NodeId)],
        mode: UnionMode,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        match mode {
            UnionMode::LeftToRight => self.union_pass(members, input, strict, state),
            UnionMode::Smart => {
                match self.union_pass(members, input, true, state) {
                    Ok(out) => Ok(out),
                    Err(signal @ (ValError::Omit | ValError::UseDefault)) => Err(signal),
                    Err(strict_failure) => {
                        if strict {
                            Err(strict_failure)
                        } else {
                            self.union_pass(members, input, false, state)
                        }
                    }
                }
            }
        }
    }

    /// One ordered attempt over every member; collects each member's
    /// violations under the member label when all of them fail.
    fn union_pass(
        &self,
        members: &[(String, NodeId)],
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let mut collected = Vec::new();
        for (label, node) in members {
            match self.run(*node, input, strict, state) {
                Ok(out) => return Ok(out),
                Err(ValError::Line(lines)) => {
                    if lines.is_empty() {
                        collected.push(crate::errors::LineError::new(
                            ErrorKind::UnionMemberFailed {
                                member: label.clone(),
                            },
                            input,
                        ));
                    } else {
                        let prefixed =
                            ValError::Line(lines).with_prefix(PathSeg::Field(label.clone()));
                        collected.extend(prefixed.into_lines());
                    }
                }
                Err(signal) => return Err(signal),
            }
        }
        Err(ValError::Line(collected))
    }

    pub(super) fn run_tagged_union(
        &self,
        discriminator: &Discriminator,
        branches: &[(String, NodeId)],
        expected_tags: &str,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let tag = match extract_tag(discriminator, input) {
            Some(tag) => tag,
            None => {
                return Err(ValError::new(
                    ErrorKind::UnionTagNotFound {
                        discriminator: discriminator.describe(),
                    },
                    input,
                ))
            }
        };
        let branch = branches.iter().find(|(label, _)| *label == tag);
        match branch {
            Some((label, node)) => self
                .run(*node, input, strict, state)
                .map_err(|e| e.with_prefix(PathSeg::Field(label.clone()))),
            None => Err(ValError::new(
                ErrorKind::UnionTagInvalid {
                    discriminator: discriminator.describe(),
                    tag,
                    expected_tags: expected_tags.to_string(),
                },
                input,
            )),
        }
    }
}

fn extract_tag(discriminator: &Discriminator, input: &Value) -> Option<String> {
    match discriminator {
        Discriminator::Field(name) => {
            let field = match input {
                Value::Map(map) => map.get_str(name),
                Value::Model(model) => model.get(name),
                _ => None,
            }?;
            field.as_str().map(str::to_string)
        }
        Discriminator::Selector(select) => select(input),
    }
}
