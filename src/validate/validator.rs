//! The validator entry points and the node dispatcher.

use std::sync::Arc;

use tracing::debug;

use crate::errors::{ErrorKind, LineError, PathSeg, ValError, ValidationReport};
use crate::schema::{
    hook_error_to_val_error, CModel, CNode, CompiledSchema, Hook, HookContext, HookError,
    InnerFailure, InnerHandle, LenConstraints, NodeId,
};
use crate::value::{ModelValue, RawValue, Value};

use super::guard::RecursionGuard;
use super::options::{CallSettings, InputSource, ValidateOptions};
use super::scalars;

/// Mutable state threaded through one validation call.
pub(super) struct ValState<'a> {
    pub settings: CallSettings,
    pub source: InputSource,
    pub context: Option<&'a Value>,
    pub guard: RecursionGuard,
}

impl ValState<'_> {
    pub(super) fn enter_guard(
        &mut self,
        identity: Option<usize>,
        input: &Value,
    ) -> Result<(), ValError> {
        self.guard
            .enter(identity)
            .map_err(|_| ValError::new(ErrorKind::RecursionLimit, input))
    }

    pub(super) fn exit_guard(&mut self, identity: Option<usize>) {
        self.guard.exit(identity);
    }
}

/// Path segment for a mapping key; string keys render bare.
pub(super) fn key_seg(key: &Value) -> PathSeg {
    match key.as_str() {
        Some(s) => PathSeg::Key(s.to_string()),
        None => PathSeg::Key(key.to_string()),
    }
}

/// Borrowed view of the compiled schema driving one call.
pub(super) struct Runner<'s> {
    pub schema: &'s CompiledSchema,
}

impl Runner<'_> {
    pub(super) fn node(&self, id: NodeId) -> &CNode {
        self.schema.node(id)
    }

    /// Validates `input` against one node; the workhorse of the tree.
    ///
    /// `strict` is the strictness inherited from the enclosing frame; a
    /// node-local override replaces it for the node and its subtree.
    pub(super) fn run(
        &self,
        id: NodeId,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        state.enter_guard(None, input)?;
        let result = self.dispatch(id, input, strict, state);
        state.exit_guard(None);
        result
    }

    fn dispatch(
        &self,
        id: NodeId,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let source = state.source;
        match self.node(id) {
            // Guard-bounded, so a degenerate self-referential alias
            // terminates with a recursion error.
            CNode::Alias(target) => self.run(*target, input, strict, state),
            CNode::Any => Ok(input.clone()),
            CNode::Null => scalars::validate_null(input),
            CNode::Bool { strict: over } => {
                scalars::validate_bool(input, over.unwrap_or(strict))
            }
            CNode::Int { con, strict: over } => {
                scalars::validate_int(input, con, over.unwrap_or(strict))
            }
            CNode::Float { con, strict: over } => {
                scalars::validate_float(input, con, over.unwrap_or(strict))
            }
            CNode::Str { con, strict: over } => {
                scalars::validate_str(input, con, over.unwrap_or(strict))
            }
            CNode::Bytes { con, strict: over } => {
                scalars::validate_bytes(input, con, over.unwrap_or(strict), source)
            }
            CNode::DateTime { strict: over } => {
                scalars::validate_datetime(input, over.unwrap_or(strict), source)
            }
            CNode::Date { strict: over } => {
                scalars::validate_date(input, over.unwrap_or(strict), source)
            }
            CNode::Time { strict: over } => {
                scalars::validate_time(input, over.unwrap_or(strict), source)
            }
            CNode::Duration { strict: over } => {
                scalars::validate_duration(input, over.unwrap_or(strict), source)
            }
            CNode::Uuid { strict: over } => {
                scalars::validate_uuid(input, over.unwrap_or(strict), source)
            }
            CNode::Url { strict: over } => {
                scalars::validate_url(input, over.unwrap_or(strict), source)
            }
            CNode::MultiHostUrl { strict: over } => {
                scalars::validate_multi_host_url(input, over.unwrap_or(strict), source)
            }
            CNode::Literal {
                expected,
                description,
            } => scalars::validate_literal(input, expected, description),
            CNode::List {
                item,
                con,
                strict: over,
            } => self.run_list(*item, *con, input, over.unwrap_or(strict), state),
            CNode::Set {
                item,
                con,
                strict: over,
            } => self.run_set(*item, *con, input, over.unwrap_or(strict), state),
            CNode::Tuple {
                items,
                strict: over,
            } => self.run_tuple(items, input, over.unwrap_or(strict), state),
            CNode::Map {
                key,
                value,
                con,
                allow_pairs,
                strict: over,
            } => self.run_map(
                *key,
                *value,
                *con,
                *allow_pairs,
                input,
                over.unwrap_or(strict),
                state,
            ),
            CNode::Model(model) => self.run_model(model, input, strict, state),
            CNode::Union { members, mode } => {
                self.run_union(members, *mode, input, strict, state)
            }
            CNode::TaggedUnion {
                discriminator,
                branches,
                expected_tags,
            } => self.run_tagged_union(
                discriminator,
                branches,
                expected_tags,
                input,
                strict,
                state,
            ),
            CNode::Nullable { inner } => {
                if input.is_null() {
                    Ok(Value::Null)
                } else {
                    self.run(*inner, input, strict, state)
                }
            }
            CNode::WithDefault {
                inner,
                default,
                validate_default,
            } => match self.run(*inner, input, strict, state) {
                Err(ValError::UseDefault) => {
                    let produced = default.produce();
                    if *validate_default {
                        self.run(*inner, &produced, strict, state)
                    } else {
                        Ok(produced)
                    }
                }
                other => other,
            },
            CNode::Hook { inner, hook } => self.run_hook(*inner, hook, input, strict, state),
            CNode::Json { inner } => self.run_json(*inner, input, strict, state),
        }
    }

    fn run_list(
        &self,
        item: NodeId,
        con: LenConstraints,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let items: &[Value] = match input {
            Value::List(v) => v,
            Value::Tuple(v) | Value::Set(v) if !strict => v,
            other => return Err(ValError::new(ErrorKind::ListType, other)),
        };
        check_len(items.len(), con, input)?;
        self.run_sequence(item, items, strict, state).map(Value::List)
    }

    fn run_set(
        &self,
        item: NodeId,
        con: LenConstraints,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let items: &[Value] = match input {
            Value::Set(v) => v,
            // A JSON array is the only possible spelling of a set.
            Value::List(v) if !strict || state.source == InputSource::Json => v,
            Value::Tuple(v) if !strict => v,
            other => return Err(ValError::new(ErrorKind::SetType, other)),
        };
        let validated = self.run_sequence(item, items, strict, state)?;
        let mut unique: Vec<Value> = Vec::with_capacity(validated.len());
        for v in validated {
            if !unique.contains(&v) {
                unique.push(v);
            }
        }
        check_len(unique.len(), con, input)?;
        Ok(Value::Set(unique))
    }

    fn run_tuple(
        &self,
        items: &[NodeId],
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let elems: &[Value] = match input {
            Value::Tuple(v) => v,
            Value::List(v) if !strict || state.source == InputSource::Json => v,
            other => return Err(ValError::new(ErrorKind::TupleType, other)),
        };
        if elems.len() != items.len() {
            return Err(ValError::new(
                ErrorKind::TupleLength {
                    expected: items.len(),
                    actual: elems.len(),
                },
                input,
            ));
        }
        let mut out = Vec::with_capacity(items.len());
        let mut lines = Vec::new();
        for (i, (node, elem)) in items.iter().zip(elems).enumerate() {
            match self.run(*node, elem, strict, state) {
                Ok(v) => out.push(v),
                Err(err) => collect_element_failure(err, i, elem, &mut lines, false),
            }
        }
        if lines.is_empty() {
            Ok(Value::Tuple(out))
        } else {
            Err(ValError::Line(lines))
        }
    }

    /// Validates every element, index-qualifying failures. Under
    /// `allow_partial` failing elements are dropped instead.
    fn run_sequence(
        &self,
        item: NodeId,
        items: &[Value],
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Vec<Value>, ValError> {
        let partial = state.settings.allow_partial;
        let mut out = Vec::with_capacity(items.len());
        let mut lines = Vec::new();
        for (i, elem) in items.iter().enumerate() {
            match self.run(item, elem, strict, state) {
                Ok(v) => out.push(v),
                Err(ValError::Omit) => {}
                Err(err) => collect_element_failure(err, i, elem, &mut lines, partial),
            }
        }
        if lines.is_empty() {
            Ok(out)
        } else {
            Err(ValError::Line(lines))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_map(
        &self,
        key: NodeId,
        value: NodeId,
        con: LenConstraints,
        allow_pairs: bool,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let entries: Vec<(Value, Value)> = match input {
            Value::Map(map) => map.iter().cloned().collect(),
            Value::List(items) | Value::Tuple(items) if allow_pairs && !strict => {
                let mut pairs = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::List(kv) | Value::Tuple(kv) if kv.len() == 2 => {
                            pairs.push((kv[0].clone(), kv[1].clone()));
                        }
                        other => {
                            return Err(ValError::new(ErrorKind::MapType, other)
                                .with_prefix(PathSeg::Index(i)));
                        }
                    }
                }
                pairs
            }
            other => return Err(ValError::new(ErrorKind::MapType, other)),
        };
        let partial = state.settings.allow_partial;
        let mut out = crate::value::ValueMap::new();
        let mut lines = Vec::new();
        for (raw_key, raw_value) in &entries {
            let seg = key_seg(raw_key);
            let valid_key = match self.run(key, raw_key, strict, state) {
                Ok(k) => Some(k),
                Err(ValError::Omit) => None,
                Err(err) => {
                    if !partial {
                        lines.extend(err.with_prefix(seg.clone()).into_lines());
                    }
                    None
                }
            };
            let Some(valid_key) = valid_key else { continue };
            match self.run(value, raw_value, strict, state) {
                Ok(v) => out.insert(valid_key, v),
                Err(ValError::Omit) => {}
                Err(err) => {
                    if !partial {
                        lines.extend(err.with_prefix(seg).into_lines());
                    }
                }
            }
        }
        if !lines.is_empty() {
            return Err(ValError::Line(lines));
        }
        check_len(out.len(), con, input)?;
        Ok(Value::Map(out))
    }

    fn run_hook(
        &self,
        inner: NodeId,
        hook: &Hook,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let hook_ctx = HookContext {
            context: state.context,
            strict,
        };
        match hook {
            Hook::Before(f) => {
                let transformed = f(input.clone(), &hook_ctx)
                    .map_err(|e| hook_error_to_val_error(e, input))?;
                self.run(inner, &transformed, strict, state)
            }
            Hook::After(f) => {
                let validated = self.run(inner, input, strict, state)?;
                f(validated, &hook_ctx).map_err(|e| hook_error_to_val_error(e, input))
            }
            Hook::Wrap(f) => {
                // Control signals cannot ride inside an InnerFailure; stash
                // them and restore if the hook re-signals the empty failure.
                let mut signal: Option<ValError> = None;
                let mut inner_fn = |v: Value| -> Result<Value, InnerFailure> {
                    match self.run(inner, &v, strict, state) {
                        Ok(out) => Ok(out),
                        Err(ValError::Line(lines)) => Err(InnerFailure(lines)),
                        Err(sig) => {
                            signal = Some(sig);
                            Err(InnerFailure(Vec::new()))
                        }
                    }
                };
                let result = f(input.clone(), InnerHandle::new(&mut inner_fn), &hook_ctx);
                match result {
                    Ok(v) => Ok(v),
                    Err(HookError::Inner(failure)) if failure.0.is_empty() => {
                        match signal {
                            Some(sig) => Err(sig),
                            None => Err(ValError::Line(Vec::new())),
                        }
                    }
                    Err(err) => Err(hook_error_to_val_error(err, input)),
                }
            }
        }
    }

    fn run_json(
        &self,
        inner: Option<NodeId>,
        input: &Value,
        strict: bool,
        state: &mut ValState<'_>,
    ) -> Result<Value, ValError> {
        let raw = match input {
            Value::Str(s) => s.clone(),
            Value::Raw(r) => r.raw.clone(),
            other => return Err(ValError::new(ErrorKind::JsonType, other)),
        };
        let parsed: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            ValError::new(ErrorKind::JsonInvalid { error: e.to_string() }, input)
        })?;
        let decoded = Value::from_json(&parsed);
        let validated = match inner {
            Some(node) => {
                let saved = state.source;
                state.source = InputSource::Json;
                let result = self.run(node, &decoded, strict, state);
                state.source = saved;
                result?
            }
            None => decoded,
        };
        Ok(Value::Raw(RawValue::new(raw, validated)))
    }
}

fn collect_element_failure(
    err: ValError,
    index: usize,
    elem: &Value,
    lines: &mut Vec<LineError>,
    partial: bool,
) {
    match err {
        ValError::Omit => {}
        ValError::UseDefault => {
            if !partial {
                lines.extend(
                    ValError::new(ErrorKind::Missing, elem)
                        .with_prefix(PathSeg::Index(index))
                        .into_lines(),
                );
            }
        }
        failure => {
            if !partial {
                lines.extend(failure.with_prefix(PathSeg::Index(index)).into_lines());
            }
        }
    }
}

fn check_len(actual: usize, con: LenConstraints, input: &Value) -> Result<(), ValError> {
    if let Some(min) = con.min_length {
        if actual < min {
            return Err(ValError::new(
                ErrorKind::TooShort {
                    min_length: min,
                    actual,
                },
                input,
            ));
        }
    }
    if let Some(max) = con.max_length {
        if actual > max {
            return Err(ValError::new(
                ErrorKind::TooLong {
                    max_length: max,
                    actual,
                },
                input,
            ));
        }
    }
    Ok(())
}

/// Validates inputs against one compiled schema.
///
/// Cheap to clone and safe to call concurrently; all per-call state lives
/// on the stack of the call.
#[derive(Clone)]
pub struct SchemaValidator {
    schema: Arc<CompiledSchema>,
}

impl SchemaValidator {
    /// A validator over the given compiled schema.
    pub fn new(schema: Arc<CompiledSchema>) -> Self {
        Self { schema }
    }

    /// The compiled schema this validator interprets.
    pub fn schema(&self) -> &CompiledSchema {
        &self.schema
    }

    /// Validates a runtime value, returning the coerced output or a full
    /// report of every violation found.
    pub fn validate_value(
        &self,
        input: &Value,
        options: &ValidateOptions,
    ) -> Result<Value, ValidationReport> {
        self.entry(input, options, InputSource::Native)
    }

    /// Boolean convenience over [`Self::validate_value`].
    pub fn is_valid(&self, input: &Value, options: &ValidateOptions) -> bool {
        self.validate_value(input, options).is_ok()
    }

    /// Parses a JSON document and validates it with the encoding-aware
    /// affordances JSON input gets even under strict mode.
    pub fn validate_json(
        &self,
        json: &str,
        options: &ValidateOptions,
    ) -> Result<Value, ValidationReport> {
        let parsed: serde_json::Value = serde_json::from_str(json).map_err(|e| {
            ValidationReport::from_lines(
                self.schema.title(),
                vec![LineError::without_input(ErrorKind::JsonInvalid {
                    error: e.to_string(),
                })],
            )
        })?;
        let input = Value::from_json(&parsed);
        self.entry(&input, options, InputSource::Json)
    }

    /// Revalidates a single field of an already-validated model value,
    /// marking the field as explicitly set on success.
    ///
    /// The schema root must be (or wrap) a model declaring the field.
    pub fn validate_field_assignment(
        &self,
        model: &ModelValue,
        field: &str,
        new: &Value,
        options: &ValidateOptions,
    ) -> Result<ModelValue, ValidationReport> {
        let settings = options.resolve(self.schema.config());
        let (cmodel, node) = match self.root_field(field) {
            Some(found) => found,
            None => {
                let report = ValidationReport::from_lines(
                    self.schema.title(),
                    ValError::new(ErrorKind::ExtraForbidden, new)
                        .with_prefix(PathSeg::Field(field.to_string()))
                        .into_lines(),
                );
                return Err(report);
            }
        };
        let mut state = ValState {
            settings,
            source: InputSource::Native,
            context: options.context.as_ref(),
            guard: RecursionGuard::new(settings.recursion_limit),
        };
        let runner = Runner {
            schema: &self.schema,
        };
        let strict = cmodel.strict.unwrap_or(settings.strict);
        match runner.run(node, new, strict, &mut state) {
            Ok(validated) => {
                let mut updated = model.clone();
                updated.set(field, validated, true);
                Ok(updated)
            }
            Err(err) => Err(ValidationReport::from_lines(
                self.schema.title(),
                err.with_prefix(PathSeg::Field(field.to_string()))
                    .into_lines(),
            )),
        }
    }

    /// Produces the schema's root default, validated when so configured.
    ///
    /// `Ok(None)` when the root declares no default.
    pub fn get_default(
        &self,
        options: &ValidateOptions,
    ) -> Result<Option<Value>, ValidationReport> {
        let settings = options.resolve(self.schema.config());
        let mut state = ValState {
            settings,
            source: InputSource::Native,
            context: options.context.as_ref(),
            guard: RecursionGuard::new(settings.recursion_limit),
        };
        let runner = Runner {
            schema: &self.schema,
        };
        match runner.default_for(self.schema.root(), &mut state) {
            None => Ok(None),
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(err)) => Err(ValidationReport::from_lines(
                self.schema.title(),
                err.into_lines(),
            )),
        }
    }

    fn entry(
        &self,
        input: &Value,
        options: &ValidateOptions,
        source: InputSource,
    ) -> Result<Value, ValidationReport> {
        let settings = options.resolve(self.schema.config());
        let mut state = ValState {
            settings,
            source,
            context: options.context.as_ref(),
            guard: RecursionGuard::new(settings.recursion_limit),
        };
        let runner = Runner {
            schema: &self.schema,
        };
        let outcome = runner.run(self.schema.root(), input, settings.strict, &mut state);
        match outcome {
            Ok(v) => Ok(v),
            Err(ValError::Omit) => Err(self.report(vec![LineError::without_input(
                ErrorKind::OmittedValue,
            )])),
            Err(ValError::UseDefault) => {
                match runner.default_for(self.schema.root(), &mut state) {
                    Some(Ok(v)) => Ok(v),
                    Some(Err(err)) => Err(self.report(err.into_lines())),
                    None => Err(self.report(vec![LineError::without_input(ErrorKind::Missing)])),
                }
            }
            Err(err) => Err(self.report(err.into_lines())),
        }
    }

    fn report(&self, lines: Vec<LineError>) -> ValidationReport {
        let report = ValidationReport::from_lines(self.schema.title(), lines);
        debug!(
            title = self.schema.title(),
            errors = report.error_count(),
            "validation failed"
        );
        report
    }

    /// Resolves the root model, looking through wrapper nodes, and the
    /// compiled node for the named field (alias included).
    fn root_field(&self, field: &str) -> Option<(&CModel, NodeId)> {
        let mut id = self.schema.root();
        let cmodel = loop {
            match self.schema.node(id) {
                CNode::Model(m) => break m,
                CNode::Alias(target) => id = *target,
                CNode::Hook { inner, .. }
                | CNode::Nullable { inner }
                | CNode::WithDefault { inner, .. } => id = *inner,
                _ => return None,
            }
        };
        cmodel
            .fields
            .iter()
            .find(|f| f.name == field || f.alias.as_deref() == Some(field))
            .map(|f| (cmodel, f.node))
    }
}
