//! Schema compilation.
//!
//! Lowers a declarative [`Schema`] description into an arena of compiled
//! nodes addressed by [`NodeId`] handles. Named references resolve to
//! handles by identity, never by re-expansion, and every structural error
//! in the description fails the whole compile.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use regex::Regex;
use tracing::debug;

use crate::config::EngineConfig;
use crate::errors::SchemaBuildError;
use crate::value::Value;

use super::hooks::Hook;
use super::node::{
    DefaultSource, Discriminator, ExtraPolicy, LenConstraints, ModelSchema, NumConstraints,
    Schema, StrConstraints, UnionMode,
};

/// Stable handle to a compiled schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compiled string constraints with the pattern pre-compiled.
#[derive(Debug, Clone)]
pub(crate) struct CStrConstraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<(String, Regex)>,
}

/// One compiled model field.
#[derive(Debug, Clone)]
pub(crate) struct CField {
    pub name: String,
    pub alias: Option<String>,
    pub serialization_alias: Option<String>,
    pub node: NodeId,
}

/// A compiled model node.
#[derive(Debug, Clone)]
pub(crate) struct CModel {
    pub name: String,
    pub fields: Vec<CField>,
    /// Every input key that populates a declared field.
    pub known_keys: HashSet<String>,
    pub extra: ExtraPolicy,
    pub populate_by_name: bool,
    pub strict: Option<bool>,
}

/// A compiled schema node; children are arena handles.
#[derive(Debug, Clone)]
pub(crate) enum CNode {
    /// Transparent forward to another slot; produced by a definition whose
    /// body is itself a reference, which may resolve to a slot that is
    /// still being built.
    Alias(NodeId),
    Any,
    Null,
    Bool {
        strict: Option<bool>,
    },
    Int {
        con: NumConstraints<i64>,
        strict: Option<bool>,
    },
    Float {
        con: NumConstraints<f64>,
        strict: Option<bool>,
    },
    Str {
        con: CStrConstraints,
        strict: Option<bool>,
    },
    Bytes {
        con: LenConstraints,
        strict: Option<bool>,
    },
    DateTime {
        strict: Option<bool>,
    },
    Date {
        strict: Option<bool>,
    },
    Time {
        strict: Option<bool>,
    },
    Duration {
        strict: Option<bool>,
    },
    Uuid {
        strict: Option<bool>,
    },
    Url {
        strict: Option<bool>,
    },
    MultiHostUrl {
        strict: Option<bool>,
    },
    Literal {
        expected: Vec<Value>,
        description: String,
    },
    List {
        item: NodeId,
        con: LenConstraints,
        strict: Option<bool>,
    },
    Set {
        item: NodeId,
        con: LenConstraints,
        strict: Option<bool>,
    },
    Tuple {
        items: Vec<NodeId>,
        strict: Option<bool>,
    },
    Map {
        key: NodeId,
        value: NodeId,
        con: LenConstraints,
        allow_pairs: bool,
        strict: Option<bool>,
    },
    Model(CModel),
    Union {
        members: Vec<(String, NodeId)>,
        mode: UnionMode,
    },
    TaggedUnion {
        discriminator: Discriminator,
        branches: Vec<(String, NodeId)>,
        /// Pre-rendered `'a', 'b'` list for the unknown-tag error.
        expected_tags: String,
    },
    Nullable {
        inner: NodeId,
    },
    WithDefault {
        inner: NodeId,
        default: DefaultSource,
        validate_default: bool,
    },
    Hook {
        inner: NodeId,
        hook: Hook,
    },
    Json {
        inner: Option<NodeId>,
    },
}

/// An immutable compiled schema, shared by validator and serializer.
///
/// Safe to share and invoke concurrently; no call mutates compiled state.
#[derive(Debug)]
pub struct CompiledSchema {
    nodes: Vec<CNode>,
    root: NodeId,
    title: String,
    config: EngineConfig,
}

impl CompiledSchema {
    /// Compiles a description under the given configuration.
    pub fn compile(schema: &Schema, config: EngineConfig) -> Result<Self, SchemaBuildError> {
        let mut compiler = Compiler {
            nodes: Vec::new(),
            defs: HashMap::new(),
        };
        let root = compiler.compile_node(schema)?;
        let title = config
            .title
            .clone()
            .unwrap_or_else(|| schema.kind_label());
        debug!(
            nodes = compiler.nodes.len(),
            title = title.as_str(),
            "schema compiled"
        );
        Ok(Self {
            nodes: compiler.nodes,
            root,
            title,
            config,
        })
    }

    /// Report title, derived from the root's declared name.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The build-time configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The root handle.
    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    /// Dereferences a handle.
    pub(crate) fn node(&self, id: NodeId) -> &CNode {
        &self.nodes[id.index()]
    }

    /// Number of compiled nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

struct Compiler {
    nodes: Vec<CNode>,
    defs: HashMap<String, NodeId>,
}

impl Compiler {
    fn compile_node(&mut self, schema: &Schema) -> Result<NodeId, SchemaBuildError> {
        match schema {
            Schema::Ref(name) => self
                .defs
                .get(name)
                .copied()
                .ok_or_else(|| SchemaBuildError::UnknownRef(name.clone())),
            Schema::Definitions { root, definitions } => {
                // Reserve every definition slot first so mutual references
                // resolve regardless of declaration order. Names are scoped:
                // the map is restored once the scope's root has compiled.
                let saved = self.defs.clone();
                let mut declared = HashSet::new();
                let mut slots = Vec::with_capacity(definitions.len());
                for (name, _) in definitions {
                    if !declared.insert(name.as_str()) {
                        return Err(SchemaBuildError::DuplicateDefinition(name.clone()));
                    }
                    let slot = self.reserve();
                    self.defs.insert(name.clone(), slot);
                    slots.push(slot);
                }
                for ((_, def), slot) in definitions.iter().zip(&slots) {
                    let compiled = self.build(def)?;
                    self.nodes[slot.index()] = compiled;
                }
                // A definition may forward through other references, but a
                // chain that never reaches a schema body is meaningless.
                for ((name, _), slot) in definitions.iter().zip(&slots) {
                    let mut cursor = *slot;
                    let mut hops = 0;
                    while let CNode::Alias(next) = self.nodes[cursor.index()] {
                        hops += 1;
                        if hops > self.nodes.len() {
                            return Err(SchemaBuildError::CircularAlias(name.clone()));
                        }
                        cursor = next;
                    }
                }
                let root = self.compile_node(root)?;
                self.defs = saved;
                Ok(root)
            }
            other => {
                let compiled = self.build(other)?;
                Ok(self.push(compiled))
            }
        }
    }

    fn reserve(&mut self) -> NodeId {
        self.push(CNode::Any)
    }

    fn push(&mut self, node: CNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    fn build(&mut self, schema: &Schema) -> Result<CNode, SchemaBuildError> {
        Ok(match schema {
            Schema::Ref(_) | Schema::Definitions { .. } => {
                // Nested scopes and references compile through
                // `compile_node`; reaching here means the caller wants a
                // standalone node. The target slot may still hold its
                // reserved placeholder, so forward by handle instead of
                // copying the node.
                CNode::Alias(self.compile_node(schema)?)
            }
            Schema::Any => CNode::Any,
            Schema::Null => CNode::Null,
            Schema::Bool { strict } => CNode::Bool { strict: *strict },
            Schema::Int {
                constraints,
                strict,
            } => {
                check_num_constraints(constraints)?;
                CNode::Int {
                    con: constraints.clone(),
                    strict: *strict,
                }
            }
            Schema::Float {
                constraints,
                strict,
            } => {
                check_num_constraints(constraints)?;
                CNode::Float {
                    con: constraints.clone(),
                    strict: *strict,
                }
            }
            Schema::Str {
                constraints,
                strict,
            } => CNode::Str {
                con: compile_str_constraints(constraints)?,
                strict: *strict,
            },
            Schema::Bytes {
                constraints,
                strict,
            } => {
                check_len_constraints(constraints)?;
                CNode::Bytes {
                    con: *constraints,
                    strict: *strict,
                }
            }
            Schema::DateTime { strict } => CNode::DateTime { strict: *strict },
            Schema::Date { strict } => CNode::Date { strict: *strict },
            Schema::Time { strict } => CNode::Time { strict: *strict },
            Schema::Duration { strict } => CNode::Duration { strict: *strict },
            Schema::Uuid { strict } => CNode::Uuid { strict: *strict },
            Schema::Url { strict } => CNode::Url { strict: *strict },
            Schema::MultiHostUrl { strict } => CNode::MultiHostUrl { strict: *strict },
            Schema::Literal { expected } => {
                if expected.is_empty() {
                    return Err(SchemaBuildError::EmptyLiteral);
                }
                let description = expected
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                CNode::Literal {
                    expected: expected.clone(),
                    description,
                }
            }
            Schema::List {
                item,
                constraints,
                strict,
            } => {
                check_len_constraints(constraints)?;
                CNode::List {
                    item: self.compile_node(item)?,
                    con: *constraints,
                    strict: *strict,
                }
            }
            Schema::Set {
                item,
                constraints,
                strict,
            } => {
                check_len_constraints(constraints)?;
                CNode::Set {
                    item: self.compile_node(item)?,
                    con: *constraints,
                    strict: *strict,
                }
            }
            Schema::Tuple { items, strict } => {
                let items = items
                    .iter()
                    .map(|s| self.compile_node(s))
                    .collect::<Result<Vec<_>, _>>()?;
                CNode::Tuple {
                    items,
                    strict: *strict,
                }
            }
            Schema::Map {
                key,
                value,
                constraints,
                allow_pairs,
                strict,
            } => {
                check_len_constraints(constraints)?;
                CNode::Map {
                    key: self.compile_node(key)?,
                    value: self.compile_node(value)?,
                    con: *constraints,
                    allow_pairs: *allow_pairs,
                    strict: *strict,
                }
            }
            Schema::Model(model) => CNode::Model(self.build_model(model)?),
            Schema::Union { members, mode } => {
                if members.is_empty() {
                    return Err(SchemaBuildError::EmptyUnion);
                }
                let members = members
                    .iter()
                    .map(|m| Ok((m.kind_label(), self.compile_node(m)?)))
                    .collect::<Result<Vec<_>, SchemaBuildError>>()?;
                CNode::Union {
                    members,
                    mode: *mode,
                }
            }
            Schema::TaggedUnion {
                discriminator,
                branches,
            } => {
                if branches.is_empty() {
                    return Err(SchemaBuildError::EmptyUnion);
                }
                let mut seen = HashSet::new();
                for (tag, _) in branches {
                    if !seen.insert(tag.as_str()) {
                        return Err(SchemaBuildError::DuplicateTag(tag.clone()));
                    }
                }
                let expected_tags = branches
                    .iter()
                    .map(|(tag, _)| format!("'{}'", tag))
                    .collect::<Vec<_>>()
                    .join(", ");
                let branches = branches
                    .iter()
                    .map(|(tag, s)| Ok((tag.clone(), self.compile_node(s)?)))
                    .collect::<Result<Vec<_>, SchemaBuildError>>()?;
                CNode::TaggedUnion {
                    discriminator: discriminator.clone(),
                    branches,
                    expected_tags,
                }
            }
            Schema::Nullable(inner) => CNode::Nullable {
                inner: self.compile_node(inner)?,
            },
            Schema::WithDefault {
                inner,
                default,
                validate_default,
            } => CNode::WithDefault {
                inner: self.compile_node(inner)?,
                default: default.clone(),
                validate_default: *validate_default,
            },
            Schema::Hook { inner, hook } => CNode::Hook {
                inner: self.compile_node(inner)?,
                hook: hook.clone(),
            },
            Schema::Json { inner } => CNode::Json {
                inner: inner
                    .as_ref()
                    .map(|s| self.compile_node(s))
                    .transpose()?,
            },
        })
    }

    fn build_model(&mut self, model: &ModelSchema) -> Result<CModel, SchemaBuildError> {
        let mut known_keys = HashSet::new();
        let mut fields = Vec::with_capacity(model.fields.len());
        for field in &model.fields {
            let node = self.compile_node(&field.schema)?;
            let populate_by_name = model.populate_by_name || field.alias.is_none();
            if let Some(alias) = &field.alias {
                if !known_keys.insert(alias.clone()) {
                    return Err(SchemaBuildError::DuplicateField(
                        alias.clone(),
                        model.name.clone(),
                    ));
                }
            }
            if populate_by_name && !known_keys.insert(field.name.clone()) {
                return Err(SchemaBuildError::DuplicateField(
                    field.name.clone(),
                    model.name.clone(),
                ));
            }
            fields.push(CField {
                name: field.name.clone(),
                alias: field.alias.clone(),
                serialization_alias: field.serialization_alias.clone(),
                node,
            });
        }
        Ok(CModel {
            name: model.name.clone(),
            fields,
            known_keys,
            extra: model.extra,
            populate_by_name: model.populate_by_name,
            strict: model.strict,
        })
    }
}

fn check_num_constraints<T: PartialOrd + Display>(
    con: &NumConstraints<T>,
) -> Result<(), SchemaBuildError> {
    if con.ge.is_some() && con.gt.is_some() {
        return Err(SchemaBuildError::ConflictingConstraints(
            "'ge' and 'gt' are mutually exclusive".into(),
        ));
    }
    if con.le.is_some() && con.lt.is_some() {
        return Err(SchemaBuildError::ConflictingConstraints(
            "'le' and 'lt' are mutually exclusive".into(),
        ));
    }
    let lower = con.ge.as_ref().or(con.gt.as_ref());
    let upper = con.le.as_ref().or(con.lt.as_ref());
    if let (Some(lo), Some(hi)) = (lower, upper) {
        if lo > hi {
            return Err(SchemaBuildError::ConflictingConstraints(format!(
                "lower bound {} exceeds upper bound {}",
                lo, hi
            )));
        }
    }
    Ok(())
}

fn check_len_constraints(con: &LenConstraints) -> Result<(), SchemaBuildError> {
    if let (Some(min), Some(max)) = (con.min_length, con.max_length) {
        if min > max {
            return Err(SchemaBuildError::ConflictingConstraints(format!(
                "min_length {} exceeds max_length {}",
                min, max
            )));
        }
    }
    Ok(())
}

fn compile_str_constraints(con: &StrConstraints) -> Result<CStrConstraints, SchemaBuildError> {
    check_len_constraints(&LenConstraints {
        min_length: con.min_length,
        max_length: con.max_length,
    })?;
    let pattern = match &con.pattern {
        Some(source) => {
            let compiled =
                Regex::new(source).map_err(|e| SchemaBuildError::InvalidPattern {
                    pattern: source.clone(),
                    error: e.to_string(),
                })?;
            Some((source.clone(), compiled))
        }
        None => None,
    };
    Ok(CStrConstraints {
        min_length: con.min_length,
        max_length: con.max_length,
        pattern,
    })
}
