// Wed Jul 22 2026 - Alex

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::decl::{ArrayLen, DeclFeed, RawDecl, RawEnumMember, RefWrapper, TypeRef};
use crate::graph::arena::TypeGraph;
use crate::graph::error::BuildError;
use crate::graph::node::{EnumMember, FieldNode, PrimitiveKind, TypeIdx, TypeKind, TypeNode};

/// What `GraphBuilder::build` hands back: the partial graph holding every
/// declaration that survived, and the errors for those that did not.
pub struct BuildOutcome {
    pub graph: TypeGraph,
    pub errors: Vec<BuildError>,
}

impl BuildOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolves raw declarations into a `TypeGraph` in two passes: intern a node
/// per surviving declaration, then patch every reference to an index. All
/// rejection happens on the raw records before interning, so the emitted
/// arena never contains half-resolved nodes.
#[derive(Default)]
pub struct GraphBuilder {
    accepted: IndexMap<String, RawDecl>,
    errors: Vec<BuildError>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_feeds(feeds: &[DeclFeed]) -> Self {
        let mut builder = Self::new();
        for feed in feeds {
            builder.add_feed(feed);
        }
        builder
    }

    pub fn add_feed(&mut self, feed: &DeclFeed) {
        debug!("adding feed '{}' ({} declarations)", feed.label, feed.len());
        for decl in &feed.decls {
            self.add_decl(decl.clone());
        }
    }

    /// Accepts one declaration, merging identical redefinitions (the same
    /// header pulled into several translation units) and recording a
    /// conflict when the same name arrives with a different shape. The
    /// first definition wins; the conflict is never silently resolved.
    pub fn add_decl(&mut self, decl: RawDecl) {
        let name = decl.name().to_string();
        if name.is_empty() {
            self.errors.push(BuildError::MalformedDeclaration {
                decl: format!("<unnamed {}>", decl.kind_name()),
                detail: "empty name".to_string(),
            });
            return;
        }
        if name == "void" || PrimitiveKind::from_c_name(&name).is_some() {
            self.errors.push(BuildError::MalformedDeclaration {
                decl: name,
                detail: "shadows a built-in type".to_string(),
            });
            return;
        }
        match self.accepted.get(&name) {
            Some(existing) if *existing == decl => {
                debug!("merged identical redefinition of '{}'", name);
            }
            Some(existing) => {
                let detail = conflict_detail(existing, &decl);
                warn!("conflicting definition of '{}': {}", name, detail);
                self.errors.push(BuildError::ConflictingDefinition { name, detail });
            }
            None => {
                self.accepted.insert(name, decl);
            }
        }
    }

    pub fn build(mut self) -> BuildOutcome {
        self.reject_malformed();
        self.reject_typedef_cycles();
        self.reject_unresolvable();

        let nodes = self.intern_and_fill();
        match TypeGraph::assemble(nodes) {
            Ok(graph) => BuildOutcome { graph, errors: self.errors },
            Err(err) => {
                // Unreachable from the phases above; keep the outcome total.
                self.errors.push(err);
                BuildOutcome { graph: TypeGraph::prelude(), errors: self.errors }
            }
        }
    }

    fn reject_malformed(&mut self) {
        let rejected: Vec<(String, String)> = self
            .accepted
            .iter()
            .filter_map(|(name, decl)| validate_decl(decl).map(|d| (name.clone(), d)))
            .collect();
        for (name, detail) in rejected {
            self.accepted.shift_remove(&name);
            self.errors.push(BuildError::MalformedDeclaration { decl: name, detail });
        }
    }

    /// Detects pure alias cycles on the raw records. A typedef chain only
    /// continues through a plain (marker-free) reference to another typedef;
    /// any pointer or array marker bottoms the chain out.
    fn reject_typedef_cycles(&mut self) {
        let mut safe: AHashSet<String> = AHashSet::new();
        let mut doomed: AHashSet<String> = AHashSet::new();

        let typedef_names: Vec<String> = self
            .accepted
            .iter()
            .filter(|(_, d)| matches!(d, RawDecl::Typedef { .. }))
            .map(|(n, _)| n.clone())
            .collect();

        for start in &typedef_names {
            if safe.contains(start) || doomed.contains(start) {
                continue;
            }
            let mut chain: Vec<String> = vec![start.clone()];
            let mut current = start.clone();
            loop {
                let next = match self.typedef_next(&current) {
                    Some(next) => next,
                    None => {
                        safe.extend(chain.iter().cloned());
                        break;
                    }
                };
                if safe.contains(&next) {
                    safe.extend(chain.iter().cloned());
                    break;
                }
                if doomed.contains(&next) {
                    // Points into an already-reported cycle; the fixpoint
                    // pass rejects these as unresolvable references.
                    break;
                }
                if let Some(pos) = chain.iter().position(|n| n == &next) {
                    let mut cycle: Vec<String> = chain[pos..].to_vec();
                    cycle.push(next);
                    doomed.extend(cycle.iter().cloned());
                    self.errors.push(BuildError::TypedefCycle { chain: cycle });
                    break;
                }
                chain.push(next.clone());
                current = next;
            }
        }

        for name in doomed {
            self.accepted.shift_remove(&name);
        }
    }

    fn typedef_next(&self, name: &str) -> Option<String> {
        match self.accepted.get(name) {
            Some(RawDecl::Typedef { target, .. }) if target.is_plain() => {
                match self.accepted.get(&target.base) {
                    Some(RawDecl::Typedef { .. }) => Some(target.base.clone()),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Removes declarations whose references cannot resolve, repeating until
    /// stable so that dependents of a rejected declaration fall with it.
    fn reject_unresolvable(&mut self) {
        loop {
            let rejected: Vec<(String, String)> = self
                .accepted
                .iter()
                .filter_map(|(name, decl)| {
                    decl.references()
                        .iter()
                        .find(|r| !self.ref_resolvable(r))
                        .map(|r| {
                            (name.clone(), format!("references unresolvable type '{}'", r.base))
                        })
                })
                .collect();
            if rejected.is_empty() {
                return;
            }
            for (name, detail) in rejected {
                self.accepted.shift_remove(&name);
                self.errors.push(BuildError::MalformedDeclaration { decl: name, detail });
            }
        }
    }

    fn ref_resolvable(&self, r: &TypeRef) -> bool {
        r.base == "void"
            || PrimitiveKind::from_c_name(&r.base).is_some()
            || self.accepted.contains_key(&r.base)
    }

    /// Pass one: void + primitive prelude, then a placeholder node per
    /// surviving declaration. Pass two: patch every placeholder with its
    /// resolved kind, creating anonymous pointer/array wrapper nodes on
    /// demand (deduplicated per pointee/element).
    fn intern_and_fill(&mut self) -> Vec<TypeNode> {
        let mut nodes: Vec<TypeNode> = vec![TypeNode::named("void", TypeKind::Void)];
        let mut table: AHashMap<String, TypeIdx> = AHashMap::new();
        table.insert("void".to_string(), TypeIdx::new(0));
        for kind in PrimitiveKind::ALL {
            let idx = TypeIdx::new(nodes.len());
            nodes.push(TypeNode::named(kind.c_name(), TypeKind::Primitive { prim: kind }));
            table.insert(kind.c_name().to_string(), idx);
        }

        for (name, decl) in &self.accepted {
            let idx = TypeIdx::new(nodes.len());
            nodes.push(TypeNode::named(name, placeholder_kind(decl)));
            table.insert(name.clone(), idx);
        }

        let mut wrappers = WrapperCache::default();
        for (name, decl) in &self.accepted {
            let idx = table[name.as_str()];
            let kind = match decl {
                RawDecl::Struct { fields, .. } => TypeKind::Struct {
                    fields: fields
                        .iter()
                        .map(|f| FieldNode {
                            name: f.name.clone(),
                            ty: wrappers.resolve(&mut nodes, &table, &f.ty),
                        })
                        .collect(),
                },
                RawDecl::Union { fields, .. } => TypeKind::Union {
                    fields: fields
                        .iter()
                        .map(|f| FieldNode {
                            name: f.name.clone(),
                            ty: wrappers.resolve(&mut nodes, &table, &f.ty),
                        })
                        .collect(),
                },
                RawDecl::Enum { .. } => continue, // final since pass one
                RawDecl::Typedef { target, .. } => TypeKind::Typedef {
                    target: wrappers.resolve(&mut nodes, &table, target),
                },
                RawDecl::Function { returns, params, variadic, .. } => {
                    TypeKind::FunctionSignature {
                        returns: wrappers.resolve(&mut nodes, &table, returns),
                        params: params
                            .iter()
                            .map(|p| wrappers.resolve(&mut nodes, &table, p))
                            .collect(),
                        variadic: *variadic,
                    }
                }
            };
            nodes[idx.as_usize()].kind = kind;
        }
        nodes
    }
}

#[derive(Default)]
struct WrapperCache {
    pointers: AHashMap<TypeIdx, TypeIdx>,
    arrays: AHashMap<(TypeIdx, ArrayLen), TypeIdx>,
}

impl WrapperCache {
    /// Reference resolution is total here: every base name was checked
    /// against the table by the fixpoint pass before interning.
    fn resolve(
        &mut self,
        nodes: &mut Vec<TypeNode>,
        table: &AHashMap<String, TypeIdx>,
        r: &TypeRef,
    ) -> TypeIdx {
        let key = PrimitiveKind::from_c_name(&r.base)
            .map(|p| p.c_name())
            .unwrap_or(r.base.as_str());
        let mut idx = table[key];
        for wrapper in &r.wrappers {
            idx = match wrapper {
                RefWrapper::Pointer => *self.pointers.entry(idx).or_insert_with(|| {
                    let wrapped = TypeIdx::new(nodes.len());
                    nodes.push(TypeNode::anon(TypeKind::Pointer { pointee: idx }));
                    wrapped
                }),
                RefWrapper::Array(count) => {
                    *self.arrays.entry((idx, *count)).or_insert_with(|| {
                        let wrapped = TypeIdx::new(nodes.len());
                        nodes.push(TypeNode::anon(TypeKind::Array {
                            element: idx,
                            count: *count,
                        }));
                        wrapped
                    })
                }
            };
        }
        idx
    }
}

fn placeholder_kind(decl: &RawDecl) -> TypeKind {
    match decl {
        RawDecl::Struct { .. } => TypeKind::Struct { fields: Vec::new() },
        RawDecl::Union { .. } => TypeKind::Union { fields: Vec::new() },
        RawDecl::Enum { members, .. } => TypeKind::Enum { members: enum_members(members) },
        RawDecl::Typedef { .. } => TypeKind::Typedef { target: TypeIdx::new(0) },
        RawDecl::Function { .. } => TypeKind::FunctionSignature {
            returns: TypeIdx::new(0),
            params: Vec::new(),
            variadic: false,
        },
    }
}

fn enum_members(raw: &[RawEnumMember]) -> Vec<EnumMember> {
    let mut next = 0i64;
    let mut out = Vec::with_capacity(raw.len());
    for member in raw {
        let value = member.value.unwrap_or(next);
        next = value.wrapping_add(1);
        out.push(EnumMember { name: member.name.clone(), value });
    }
    out
}

/// First problem with a declaration taken in isolation, or None.
fn validate_decl(decl: &RawDecl) -> Option<String> {
    match decl {
        RawDecl::Struct { fields, .. } | RawDecl::Union { fields, .. } => {
            if fields.is_empty() {
                return Some("no fields".to_string());
            }
            let mut seen: AHashSet<&str> = AHashSet::new();
            for field in fields {
                if field.name.is_empty() {
                    return Some("unnamed field".to_string());
                }
                if !seen.insert(&field.name) {
                    return Some(format!("duplicate field '{}'", field.name));
                }
                if let Some(detail) = check_ref(&field.ty, false) {
                    return Some(format!("field '{}': {}", field.name, detail));
                }
            }
            None
        }
        RawDecl::Enum { members, .. } => {
            if members.is_empty() {
                return Some("no members".to_string());
            }
            let mut seen: AHashSet<&str> = AHashSet::new();
            for member in members {
                if !seen.insert(&member.name) {
                    return Some(format!("duplicate member '{}'", member.name));
                }
            }
            None
        }
        RawDecl::Typedef { target, .. } => check_ref(target, true),
        RawDecl::Function { returns, params, .. } => {
            if let Some(detail) = check_ref(returns, true) {
                return Some(format!("return type: {}", detail));
            }
            for (i, param) in params.iter().enumerate() {
                if let Some(detail) = check_ref(param, false) {
                    return Some(format!("parameter {}: {}", i, detail));
                }
            }
            None
        }
    }
}

/// `allow_plain_void` is true where C permits an unsized use of void
/// (typedef targets and return types); fields and parameters need a pointer
/// marker before any void base.
fn check_ref(r: &TypeRef, allow_plain_void: bool) -> Option<String> {
    if r.base.is_empty() {
        return Some("empty type name".to_string());
    }
    if r.wrappers
        .iter()
        .any(|w| matches!(w, RefWrapper::Array(ArrayLen::Fixed(0))))
    {
        return Some("zero-length array".to_string());
    }
    if r.base == "void" {
        let ok = match r.wrappers.first() {
            Some(RefWrapper::Pointer) => true,
            Some(RefWrapper::Array(_)) => false,
            None => allow_plain_void,
        };
        if !ok {
            return Some("void has no size here".to_string());
        }
    }
    None
}

fn conflict_detail(old: &RawDecl, new: &RawDecl) -> String {
    if old.kind_name() != new.kind_name() {
        return format!("redeclared as {} (was {})", new.kind_name(), old.kind_name());
    }
    match (old, new) {
        (RawDecl::Struct { fields: a, .. }, RawDecl::Struct { fields: b, .. })
        | (RawDecl::Union { fields: a, .. }, RawDecl::Union { fields: b, .. }) => {
            if a.len() != b.len() {
                return format!("field count {} vs {}", a.len(), b.len());
            }
            for (fa, fb) in a.iter().zip(b.iter()) {
                if fa.name != fb.name {
                    return format!("field '{}' vs '{}'", fa.name, fb.name);
                }
                if fa.ty != fb.ty {
                    return format!("field '{}': {} vs {}", fa.name, fa.ty, fb.ty);
                }
            }
            "definitions differ".to_string()
        }
        (RawDecl::Enum { members: a, .. }, RawDecl::Enum { members: b, .. }) => {
            if a.len() != b.len() {
                return format!("member count {} vs {}", a.len(), b.len());
            }
            "member lists differ".to_string()
        }
        (RawDecl::Typedef { target: a, .. }, RawDecl::Typedef { target: b, .. }) => {
            format!("target {} vs {}", a, b)
        }
        _ => "signatures differ".to_string(),
    }
}
