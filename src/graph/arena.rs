// Tue Jul 21 2026 - Alex

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::decl::ArrayLen;
use crate::graph::error::{BuildError, GraphLoadError};
use crate::graph::node::{PrimitiveKind, TypeIdx, TypeKind, TypeNode};
use crate::graph::typedefs::{resolve_chain, TypedefEntry};

/// Append-only arena of type nodes. Nodes reference each other by `TypeIdx`,
/// which is what lets self- and mutually-referential C types exist without
/// ownership cycles. Immutable once assembled.
#[derive(Debug, Clone)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    names: IndexMap<String, TypeIdx>,
    typedefs: IndexMap<String, TypedefEntry>,
}

/// On-disk form of a graph: just the node list. The name table and typedef
/// registry are derived data and are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct GraphFile {
    nodes: Vec<TypeNode>,
}

impl TypeGraph {
    /// Builds a graph holding only the void node and the primitive prelude.
    pub fn prelude() -> TypeGraph {
        let mut nodes = vec![TypeNode::named("void", TypeKind::Void)];
        for kind in PrimitiveKind::ALL {
            nodes.push(TypeNode::named(kind.c_name(), TypeKind::Primitive { prim: kind }));
        }
        match Self::assemble(nodes) {
            Ok(graph) => graph,
            Err(_) => unreachable!("prelude nodes are closed and acyclic"),
        }
    }

    /// Validates a node list and derives the lookup tables. This is the only
    /// constructor: the builder and the JSON loader both funnel through it,
    /// so every live `TypeGraph` upholds the index and acyclicity invariants.
    pub fn assemble(nodes: Vec<TypeNode>) -> Result<TypeGraph, BuildError> {
        let mut names: IndexMap<String, TypeIdx> = IndexMap::new();
        for (i, node) in nodes.iter().enumerate() {
            let idx = TypeIdx::new(i);
            check_node(&nodes, idx, node)?;
            if let Some(name) = &node.name {
                if names.insert(name.clone(), idx).is_some() {
                    return Err(BuildError::ConflictingDefinition {
                        name: name.clone(),
                        detail: "duplicate name in node list".to_string(),
                    });
                }
            }
        }

        let mut typedefs: IndexMap<String, TypedefEntry> = IndexMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if let TypeKind::Typedef { .. } = node.kind {
                let idx = TypeIdx::new(i);
                let (target, depth) = resolve_chain(&nodes, idx)?;
                let alias = node.name.clone().unwrap_or_else(|| idx.to_string());
                typedefs.insert(
                    alias.clone(),
                    TypedefEntry { alias, node: idx, target, depth },
                );
            }
        }

        Ok(TypeGraph { nodes, names, typedefs })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: TypeIdx) -> &TypeNode {
        &self.nodes[idx.as_usize()]
    }

    pub fn get(&self, idx: TypeIdx) -> Option<&TypeNode> {
        self.nodes.get(idx.as_usize())
    }

    pub(crate) fn nodes(&self) -> &[TypeNode] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeIdx, &TypeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (TypeIdx::new(i), n))
    }

    /// Looks a name up, normalizing primitive spellings first so that
    /// `"signed int"` and `"int"` land on the same node.
    pub fn lookup(&self, name: &str) -> Option<TypeIdx> {
        if let Some(prim) = PrimitiveKind::from_c_name(name) {
            if let Some(idx) = self.names.get(prim.c_name()) {
                return Some(*idx);
            }
        }
        self.names.get(name).copied()
    }

    /// Named nodes that represent declarations (everything except the void
    /// and primitive prelude), in insertion order.
    pub fn declared_roots(&self) -> Vec<(&str, TypeIdx)> {
        self.names
            .iter()
            .filter(|(_, idx)| {
                !matches!(
                    self.node(**idx).kind,
                    TypeKind::Void | TypeKind::Primitive { .. }
                )
            })
            .map(|(name, idx)| (name.as_str(), *idx))
            .collect()
    }

    pub fn typedef_entries(&self) -> impl Iterator<Item = &TypedefEntry> {
        self.typedefs.values()
    }

    /// Collapses typedef links starting at `idx`. Assembled graphs are
    /// acyclic through typedef links, so the loop is bounded by the arena.
    pub fn resolve(&self, idx: TypeIdx) -> TypeIdx {
        let mut current = idx;
        for _ in 0..=self.nodes.len() {
            match &self.node(current).kind {
                TypeKind::Typedef { target } => current = *target,
                _ => return current,
            }
        }
        current
    }

    /// Resolves an alias name to its final target index. Non-typedef names
    /// resolve to themselves, so the operation is idempotent.
    pub fn resolve_typedef(&self, name: &str) -> Result<TypeIdx, BuildError> {
        if let Some(entry) = self.typedefs.get(name) {
            return Ok(entry.target);
        }
        self.lookup(name).ok_or_else(|| BuildError::UnknownType { name: name.to_string() })
    }

    /// C-ish rendering of a node for diagnostics: named nodes print their
    /// name, anonymous wrappers print inside-out (`char[4]*`).
    pub fn display_name(&self, idx: TypeIdx) -> String {
        self.render_name(idx, 0)
    }

    fn render_name(&self, idx: TypeIdx, depth: usize) -> String {
        if depth > 32 {
            return idx.to_string();
        }
        let node = match self.get(idx) {
            Some(node) => node,
            None => return idx.to_string(),
        };
        if let Some(name) = &node.name {
            return name.clone();
        }
        match &node.kind {
            TypeKind::Void => "void".to_string(),
            TypeKind::Primitive { prim } => prim.c_name().to_string(),
            TypeKind::Pointer { pointee } => {
                format!("{}*", self.render_name(*pointee, depth + 1))
            }
            TypeKind::Array { element, count } => match count {
                ArrayLen::Fixed(n) => {
                    format!("{}[{}]", self.render_name(*element, depth + 1), n)
                }
                ArrayLen::Unresolved => {
                    format!("{}[]", self.render_name(*element, depth + 1))
                }
            },
            TypeKind::FunctionSignature { returns, params, variadic } => {
                let mut args: Vec<String> =
                    params.iter().map(|p| self.render_name(*p, depth + 1)).collect();
                if *variadic {
                    args.push("...".to_string());
                }
                format!("{}({})", self.render_name(*returns, depth + 1), args.join(", "))
            }
            TypeKind::Typedef { target } => self.render_name(*target, depth + 1),
            TypeKind::Struct { .. } | TypeKind::Union { .. } | TypeKind::Enum { .. } => {
                format!("{} {}", node.kind.kind_name(), idx)
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&GraphFile { nodes: self.nodes.clone() })
    }

    pub fn from_json(json: &str) -> Result<TypeGraph, GraphLoadError> {
        let file: GraphFile = serde_json::from_str(json)?;
        Ok(Self::assemble(file.nodes)?)
    }

    pub fn from_json_path(path: &Path) -> Result<TypeGraph, GraphLoadError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Bounds-checks every index a node carries and rejects duplicate field or
/// member names within one aggregate.
fn check_node(nodes: &[TypeNode], idx: TypeIdx, node: &TypeNode) -> Result<(), BuildError> {
    let context = || {
        node.name
            .clone()
            .unwrap_or_else(|| format!("{} {}", node.kind.kind_name(), idx))
    };
    let check = |target: TypeIdx| -> Result<(), BuildError> {
        if target.as_usize() >= nodes.len() {
            return Err(BuildError::InvalidIndex { index: target, context: context() });
        }
        Ok(())
    };

    match &node.kind {
        TypeKind::Void | TypeKind::Primitive { .. } | TypeKind::Enum { .. } => {}
        TypeKind::Pointer { pointee } => check(*pointee)?,
        TypeKind::Array { element, .. } => check(*element)?,
        TypeKind::Typedef { target } => check(*target)?,
        TypeKind::Struct { fields } | TypeKind::Union { fields } => {
            for field in fields {
                check(field.ty)?;
            }
            let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
            for field in fields {
                if seen.contains(&field.name.as_str()) {
                    return Err(BuildError::MalformedDeclaration {
                        decl: context(),
                        detail: format!("duplicate field '{}'", field.name),
                    });
                }
                seen.push(&field.name);
            }
        }
        TypeKind::FunctionSignature { returns, params, .. } => {
            check(*returns)?;
            for p in params {
                check(*p)?;
            }
        }
    }
    Ok(())
}
