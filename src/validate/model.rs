//! Model validation: named fields, aliasing, defaults, extra-key policy.
//!
//! Strict native input must already be a model value; mappings are a lax
//! (or JSON-source) affordance, and opaque host objects are read through
//! the attribute seam only when `from_attributes` is on. Field failures
//! accumulate under the logical field name so one call reports every
//! violation.

use crate::errors::{ErrorKind, PathSeg, ValError};
use crate::schema::{CField, CModel, ExtraPolicy, NodeId};
use crate::value::{ModelValue, Value};

use super::options::InputSource;
use super::validator::{Runner, ValState};

/// What a field lookup yielded before sub-validation.
enum FieldInput {
    Present(Value),
    Absent,
}

impl Runner<'_> {
    pub(super) fn run_model(
        &self,
        model: &CModel,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let strict = model.strict.unwrap_or(strict);
        match input {
            Value::Model(existing) => {
                self.model_from_lookup(model, strict, state, |field| {
                    lookup_in_model(existing, field)
                })
                .map(|mut out| {
                    if model.extra == ExtraPolicy::Capture {
                        capture_model_extras(model, existing, &mut out);
                    }
                    Value::Model(out)
                })
            }
            Value::Map(map) if !strict || state.source == InputSource::Json => {
                let mut out = self.model_from_lookup(model, strict, state, |field| {
                    lookup_in_map(map, model, field)
                })?;
                apply_extra_policy(model, map, &mut out)?;
                Ok(Value::Model(out))
            }
            Value::Opaque(obj) if state.settings.from_attributes => {
                let identity = obj.identity();
                state.enter_guard(Some(identity), input)?;
                let result = self.model_from_lookup(model, strict, state, |field| {
                    lookup_in_attributes(obj, model, field)
                });
                state.exit_guard(Some(identity));
                result.map(Value::Model)
            }
            other => Err(ValError::new(
                ErrorKind::ModelType {
                    model: model.name.clone(),
                },
                other,
            )),
        }
    }

    /// Drives the per-field loop over any lookup source.
    fn model_from_lookup(
        &self,
        model: &CModel,
        strict: bool,
        state: &mut ValState<'_>,
        lookup: impl Fn(&CField) -> FieldInput,
    ) -> Result<ModelValue, ValError> {
        let mut out = ModelValue::new(model.name.clone());
        let mut lines = Vec::new();
        for field in &model.fields {
            match lookup(field) {
                FieldInput::Present(raw) => {
                    match self.run(field.node, &raw, strict, state) {
                        Ok(validated) => out.set(field.name.clone(), validated, true),
                        Err(ValError::Line(errs)) => {
                            let prefixed = ValError::Line(errs)
                                .with_prefix(PathSeg::Field(field.name.clone()));
                            lines.extend(prefixed.into_lines());
                        }
                        Err(ValError::Omit) => {}
                        Err(ValError::UseDefault) => {
                            self.fill_default(field, &mut out, &mut lines, state)
                        }
                    }
                }
                FieldInput::Absent => self.fill_default(field, &mut out, &mut lines, state),
            }
        }
        if lines.is_empty() {
            Ok(out)
        } else {
            Err(ValError::Line(lines))
        }
    }

    /// Applies the field default, or records a `missing` violation.
    fn fill_default(
        &self,
        field: &CField,
        out: &mut ModelValue,
        lines: &mut Vec<crate::errors::LineError>,
        state: &mut ValState<'_>,
    ) {
        match self.default_for(field.node, state) {
            Some(Ok(default)) => out.set(field.name.clone(), default, false),
            Some(Err(err)) => {
                let prefixed = err.with_prefix(PathSeg::Field(field.name.clone()));
                lines.extend(prefixed.into_lines());
            }
            None => {
                let prefixed = ValError::without_input(ErrorKind::Missing)
                    .with_prefix(PathSeg::Field(field.name.clone()));
                lines.extend(prefixed.into_lines());
            }
        }
    }

    /// Produces the default for a node, if it declares one.
    ///
    /// Hook wrappers are transparent here; the default belongs to the
    /// wrapped node. With `validate_default` the produced value runs
    /// through the inner validator.
    pub(super) fn default_for(
        &self,
        id: NodeId,
        state: &mut ValState<'_>,
    ) -> Option<Result<Value, ValError>> {
        use crate::schema::CNode;
        match self.node(id) {
            CNode::WithDefault {
                inner,
                default,
                validate_default,
            } => {
                let produced = default.produce();
                if *validate_default {
                    Some(self.run(*inner, &produced, state.settings.strict, state))
                } else {
                    Some(Ok(produced))
                }
            }
            CNode::Hook { inner, .. } => self.default_for(*inner, state),
            CNode::Alias(target) => self.default_for(*target, state),
            _ => None,
        }
    }

}

/// Handles keys the model does not declare.
fn apply_extra_policy(
    model: &CModel,
    map: &crate::value::ValueMap,
    out: &mut ModelValue,
) -> Result<(), ValError> {
    let mut lines = Vec::new();
    for (key, value) in map.iter() {
        let known = key
            .as_str()
            .map(|k| model.known_keys.contains(k))
            .unwrap_or(false);
        if known {
            continue;
        }
        match model.extra {
            ExtraPolicy::Ignore => {}
            ExtraPolicy::Forbid => {
                let prefixed = ValError::new(ErrorKind::ExtraForbidden, value)
                    .with_prefix(super::validator::key_seg(key));
                lines.extend(prefixed.into_lines());
            }
            ExtraPolicy::Capture => {
                if let Some(name) = key.as_str() {
                    out.set(name, value.clone(), true);
                }
            }
        }
    }
    if lines.is_empty() {
        Ok(())
    } else {
        Err(ValError::Line(lines))
    }
}

fn lookup_in_map(
    map: &crate::value::ValueMap,
    model: &CModel,
    field: &CField,
) -> FieldInput {
    if let Some(alias) = &field.alias {
        if let Some(v) = map.get_str(alias) {
            return FieldInput::Present(v.clone());
        }
        if !model.populate_by_name {
            return FieldInput::Absent;
        }
    }
    match map.get_str(&field.name) {
        Some(v) => FieldInput::Present(v.clone()),
        None => FieldInput::Absent,
    }
}

fn lookup_in_model(existing: &ModelValue, field: &CField) -> FieldInput {
    match existing.get(&field.name) {
        Some(v) => FieldInput::Present(v.clone()),
        None => FieldInput::Absent,
    }
}

fn lookup_in_attributes(
    obj: &crate::value::OpaqueRef,
    model: &CModel,
    field: &CField,
) -> FieldInput {
    if let Some(alias) = &field.alias {
        if let Some(v) = obj.get_attribute(alias) {
            return FieldInput::Present(v);
        }
        if !model.populate_by_name {
            return FieldInput::Absent;
        }
    }
    match obj.get_attribute(&field.name) {
        Some(v) => FieldInput::Present(v),
        None => FieldInput::Absent,
    }
}

/// Carries captured extras forward when revalidating an existing model.
fn capture_model_extras(model: &CModel, existing: &ModelValue, out: &mut ModelValue) {
    for (name, value) in existing.iter() {
        let declared = model.fields.iter().any(|f| f.name == *name);
        if !declared && out.get(name).is_none() {
            out.set(name.clone(), value.clone(), existing.is_set(name));
        }
    }
}
