// Thu Jul 23 2026 - Alex

use ahash::AHashSet;
use log::trace;
use once_cell::sync::OnceCell;
use rayon::prelude::*;

use crate::decl::ArrayLen;
use crate::graph::arena::TypeGraph;
use crate::graph::node::{TypeIdx, TypeKind};
use crate::layout::alignment::Alignment;
use crate::layout::error::LayoutError;
use crate::layout::info::{FieldLayout, LayoutInfo};
use crate::layout::offset::Offset;
use crate::layout::size::Size;
use crate::layout::target::TargetModel;

/// Computes sizes, alignments and field offsets for one graph under one
/// target model. Results are memoized per index in write-once cells, so the
/// engine can be shared across rayon workers; each cell is written exactly
/// once and identical on every recomputation.
pub struct LayoutEngine<'g> {
    graph: &'g TypeGraph,
    target: TargetModel,
    memo: Vec<OnceCell<Result<LayoutInfo, LayoutError>>>,
}

/// Per-walk descent state. An index enters the set before its value
/// containment is descended and is never re-entered within one walk: any
/// second visit before the memo cell is written means value recursion.
#[derive(Default)]
struct Walk {
    in_progress: AHashSet<TypeIdx>,
    trail: Vec<TypeIdx>,
}

impl Walk {
    fn enter(&mut self, idx: TypeIdx) -> bool {
        if !self.in_progress.insert(idx) {
            return false;
        }
        self.trail.push(idx);
        true
    }

    fn cycle_names(&self, graph: &TypeGraph, repeat: TypeIdx) -> Vec<String> {
        let start = self.trail.iter().position(|i| *i == repeat).unwrap_or(0);
        let mut names: Vec<String> =
            self.trail[start..].iter().map(|i| graph.display_name(*i)).collect();
        names.push(graph.display_name(repeat));
        names
    }
}

impl<'g> LayoutEngine<'g> {
    pub fn new(graph: &'g TypeGraph, target: TargetModel) -> Self {
        let memo = (0..graph.len()).map(|_| OnceCell::new()).collect();
        Self { graph, target, memo }
    }

    pub fn graph(&self) -> &'g TypeGraph {
        self.graph
    }

    pub fn target(&self) -> &TargetModel {
        &self.target
    }

    /// Layout of one node, computed on first use and remembered. An error
    /// poisons only this node and whatever contains it.
    pub fn layout_of(&self, idx: TypeIdx) -> Result<LayoutInfo, LayoutError> {
        let mut walk = Walk::default();
        self.compute(idx, &mut walk)
    }

    /// Lays out every declared root in parallel. Distinct roots share the
    /// memo, so common subtrees are computed once whichever worker gets
    /// there first.
    pub fn layout_all(&self) -> Vec<(String, TypeIdx, Result<LayoutInfo, LayoutError>)> {
        let roots: Vec<(String, TypeIdx)> = self
            .graph
            .declared_roots()
            .into_iter()
            .map(|(name, idx)| (name.to_string(), idx))
            .collect();
        roots
            .into_par_iter()
            .map(|(name, idx)| {
                let result = self.layout_of(idx);
                (name, idx, result)
            })
            .collect()
    }

    fn compute(&self, idx: TypeIdx, walk: &mut Walk) -> Result<LayoutInfo, LayoutError> {
        let cell = self
            .memo
            .get(idx.as_usize())
            .ok_or(LayoutError::UnknownIndex { index: idx })?;
        if let Some(cached) = cell.get() {
            return cached.clone();
        }
        let result = self.compute_fresh(idx, walk);
        cell.get_or_init(|| result).clone()
    }

    fn compute_fresh(&self, idx: TypeIdx, walk: &mut Walk) -> Result<LayoutInfo, LayoutError> {
        let node = self.graph.get(idx).ok_or(LayoutError::UnknownIndex { index: idx })?;
        trace!("layout {} ({})", self.graph.display_name(idx), node.kind.kind_name());

        match &node.kind {
            TypeKind::Void => Ok(LayoutInfo::scalar(Size::zero(), Alignment::one())),
            TypeKind::Primitive { prim } => Ok(LayoutInfo::scalar(
                Size::new(self.target.primitive_size(*prim)),
                self.target.primitive_alignment(*prim),
            )),
            // Pointers and function signatures never descend into what they
            // reference; that is what makes recursive types layoutable.
            TypeKind::Pointer { .. } | TypeKind::FunctionSignature { .. } => Ok(
                LayoutInfo::scalar(Size::new(self.target.pointer_size), self.target.pointer_alignment()),
            ),
            TypeKind::Enum { .. } => Ok(LayoutInfo::scalar(
                Size::new(self.target.enum_size),
                self.target.enum_alignment(),
            )),
            TypeKind::Typedef { target } => {
                self.descend(idx, walk)?;
                self.compute(*target, walk)
            }
            TypeKind::Array { element, count } => {
                self.descend(idx, walk)?;
                let count = match count {
                    ArrayLen::Fixed(n) => *n,
                    ArrayLen::Unresolved => {
                        return Err(LayoutError::UnresolvedArrayLength {
                            name: self.graph.display_name(idx),
                        })
                    }
                };
                let element = self.compute(*element, walk)?;
                let size = element.size.checked_mul(count).ok_or_else(|| {
                    LayoutError::SizeOverflow { name: self.graph.display_name(idx) }
                })?;
                Ok(LayoutInfo::scalar(size, element.align))
            }
            TypeKind::Struct { fields } => {
                self.descend(idx, walk)?;
                let mut cursor = 0u64;
                let mut align = Alignment::one();
                let mut placed = Vec::with_capacity(fields.len());
                for field in fields {
                    let inner = self.compute(field.ty, walk)?;
                    let start = inner.align.align(cursor);
                    placed.push(FieldLayout {
                        name: field.name.clone(),
                        ty: field.ty,
                        offset: Offset::new(start),
                        size: inner.size,
                    });
                    cursor = start.checked_add(inner.size.as_u64()).ok_or_else(|| {
                        LayoutError::SizeOverflow { name: self.graph.display_name(idx) }
                    })?;
                    align = align.max(inner.align);
                }
                Ok(LayoutInfo {
                    size: Size::new(align.align(cursor)),
                    align,
                    fields: placed,
                })
            }
            TypeKind::Union { fields } => {
                self.descend(idx, walk)?;
                let mut size = 0u64;
                let mut align = Alignment::one();
                let mut placed = Vec::with_capacity(fields.len());
                for field in fields {
                    let inner = self.compute(field.ty, walk)?;
                    placed.push(FieldLayout {
                        name: field.name.clone(),
                        ty: field.ty,
                        offset: Offset::zero(),
                        size: inner.size,
                    });
                    size = size.max(inner.size.as_u64());
                    align = align.max(inner.align);
                }
                Ok(LayoutInfo { size: Size::new(align.align(size)), align, fields: placed })
            }
        }
    }

    /// Marks `idx` as in progress for this walk. Re-entry means the node
    /// contains itself by value; a trail longer than the arena means the
    /// walk itself is broken, which well-formed graphs cannot produce.
    fn descend(&self, idx: TypeIdx, walk: &mut Walk) -> Result<(), LayoutError> {
        if !walk.enter(idx) {
            return Err(LayoutError::InvalidRecursiveValueType {
                cycle: walk.cycle_names(self.graph, idx),
            });
        }
        if walk.trail.len() > self.graph.len() {
            return Err(LayoutError::UnboundedRecursion { depth: walk.trail.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclFeed;
    use crate::graph::builder::GraphBuilder;

    fn graph_of(json: &str) -> TypeGraph {
        let feed = DeclFeed::from_json_str("test", json).unwrap();
        let out = GraphBuilder::from_feeds(&[feed]).build();
        assert!(out.is_clean(), "build errors: {:?}", out.errors);
        out.graph
    }

    fn layout(graph: &TypeGraph, name: &str) -> LayoutInfo {
        let engine = LayoutEngine::new(graph, TargetModel::lp64());
        engine.layout_of(graph.lookup(name).unwrap()).unwrap()
    }

    #[test]
    fn test_int_char_int_pads_to_twelve() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "s", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "char"},
                {"name": "c", "type": "int"}]}]"#,
        );
        let info = layout(&graph, "s");
        assert_eq!(info.size.as_u64(), 12);
        assert_eq!(info.align.as_u64(), 4);
        assert_eq!(info.offsets(), vec![0, 4, 8]);
        assert_eq!(info.paddings(), vec![(Offset::new(5), 3)]);
    }

    #[test]
    fn test_char_int_char_same_shape() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "s", "fields": [
                {"name": "a", "type": "char"},
                {"name": "b", "type": "int"},
                {"name": "c", "type": "char"}]}]"#,
        );
        let info = layout(&graph, "s");
        assert_eq!(info.size.as_u64(), 12);
        assert_eq!(info.align.as_u64(), 4);
        assert_eq!(info.offsets(), vec![0, 4, 8]);
    }

    #[test]
    fn test_union_is_max_member_padded() {
        let graph = graph_of(
            r#"[{"kind": "union", "name": "myunion", "fields": [
                {"name": "i", "type": "int"},
                {"name": "c", "type": "char"},
                {"name": "d", "type": "double"},
                {"name": "buf", "type": "char[32]"}]}]"#,
        );
        let info = layout(&graph, "myunion");
        assert_eq!(info.size.as_u64(), 32);
        assert_eq!(info.align.as_u64(), 8);
        assert!(info.offsets().iter().all(|o| *o == 0));
    }

    #[test]
    fn test_mutual_pointer_structs() {
        let graph = graph_of(
            r#"[
            {"kind": "struct", "name": "A", "fields": [
                {"name": "x", "type": "int"}, {"name": "y", "type": "int"},
                {"name": "z", "type": "int"}, {"name": "b", "type": "B*"}]},
            {"kind": "struct", "name": "B", "fields": [
                {"name": "q", "type": "char"}, {"name": "r", "type": "char"},
                {"name": "s", "type": "char"}, {"name": "a", "type": "A*"}]}
        ]"#,
        );
        let a = layout(&graph, "A");
        assert_eq!(a.size.as_u64(), 24);
        assert_eq!(a.offsets(), vec![0, 4, 8, 16]);
        let b = layout(&graph, "B");
        assert_eq!(b.size.as_u64(), 16);
        assert_eq!(b.offsets(), vec![0, 1, 2, 8]);
    }

    #[test]
    fn test_double_pointer_breaks_recursion() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "C", "fields": [
                {"name": "n1", "type": "int"},
                {"name": "c", "type": "C**"}]}]"#,
        );
        let info = layout(&graph, "C");
        assert_eq!(info.size.as_u64(), 16);
        assert_eq!(info.offsets(), vec![0, 8]);
    }

    #[test]
    fn test_value_self_containment_is_an_error() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "bad", "fields": [
                {"name": "again", "type": "bad"}]}]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let err = engine.layout_of(graph.lookup("bad").unwrap()).unwrap_err();
        match err {
            LayoutError::InvalidRecursiveValueType { cycle } => {
                assert_eq!(cycle, vec!["bad", "bad"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mutual_value_containment_names_the_cycle() {
        let graph = graph_of(
            r#"[
            {"kind": "struct", "name": "A", "fields": [{"name": "b", "type": "B"}]},
            {"kind": "struct", "name": "B", "fields": [{"name": "a", "type": "A"}]}
        ]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let err = engine.layout_of(graph.lookup("A").unwrap()).unwrap_err();
        match err {
            LayoutError::InvalidRecursiveValueType { cycle } => {
                assert_eq!(cycle, vec!["A", "B", "A"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_typedef_layout_matches_target() {
        let graph = graph_of(
            r#"[
            {"kind": "typedef", "name": "int_t", "target": "int"},
            {"kind": "typedef", "name": "int_t2", "target": "int_t"}
        ]"#,
        );
        let info = layout(&graph, "int_t2");
        assert_eq!(info.size.as_u64(), 4);
        assert_eq!(info.align.as_u64(), 4);
    }

    #[test]
    fn test_two_dimensional_array() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "grid", "fields": [
                {"name": "cells", "type": "int[10][10]"}]}]"#,
        );
        let info = layout(&graph, "grid");
        assert_eq!(info.size.as_u64(), 400);
        assert_eq!(info.align.as_u64(), 4);
    }

    #[test]
    fn test_unresolved_array_length_poisons_only_its_subtree() {
        let graph = graph_of(
            r#"[
            {"kind": "struct", "name": "vague", "fields": [{"name": "buf", "type": "char[]"}]},
            {"kind": "struct", "name": "fine", "fields": [{"name": "x", "type": "int"}]}
        ]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let err = engine.layout_of(graph.lookup("vague").unwrap()).unwrap_err();
        assert!(matches!(err, LayoutError::UnresolvedArrayLength { .. }));
        assert!(engine.layout_of(graph.lookup("fine").unwrap()).is_ok());
    }

    #[test]
    fn test_pointer_to_unresolved_array_is_fine() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "s", "fields": [
                {"name": "p", "type": "char[]*"}]}]"#,
        );
        let info = layout(&graph, "s");
        assert_eq!(info.size.as_u64(), 8);
    }

    #[test]
    fn test_packed_layout_drops_padding() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "s", "fields": [
                {"name": "a", "type": "char"},
                {"name": "b", "type": "int"},
                {"name": "c", "type": "char"}]}]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64().packed());
        let info = engine.layout_of(graph.lookup("s").unwrap()).unwrap();
        assert_eq!(info.size.as_u64(), 6);
        assert_eq!(info.align.as_u64(), 1);
        assert_eq!(info.offsets(), vec![0, 1, 5]);
    }

    #[test]
    fn test_function_and_enum_scalars() {
        let graph = graph_of(
            r#"[
            {"kind": "function", "name": "f", "returns": "void", "params": ["int"]},
            {"kind": "enum", "name": "E", "members": [{"name": "A"}, {"name": "B"}]}
        ]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let f = engine.layout_of(graph.lookup("f").unwrap()).unwrap();
        assert_eq!(f.size.as_u64(), 8);
        let e = engine.layout_of(graph.lookup("E").unwrap()).unwrap();
        assert_eq!(e.size.as_u64(), 4);
        assert_eq!(e.align.as_u64(), 4);
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "s", "fields": [
                {"name": "a", "type": "int"}, {"name": "b", "type": "double"}]}]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let idx = graph.lookup("s").unwrap();
        let first = engine.layout_of(idx).unwrap();
        let second = engine.layout_of(idx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_layout_all_isolates_errors_per_root() {
        let graph = graph_of(
            r#"[
            {"kind": "struct", "name": "good", "fields": [{"name": "x", "type": "int"}]},
            {"kind": "struct", "name": "loop", "fields": [{"name": "l", "type": "loop"}]}
        ]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let results = engine.layout_all();
        assert_eq!(results.len(), 2);
        let good = results.iter().find(|(n, _, _)| n == "good").unwrap();
        assert!(good.2.is_ok());
        let bad = results.iter().find(|(n, _, _)| n == "loop").unwrap();
        assert!(matches!(bad.2, Err(LayoutError::InvalidRecursiveValueType { .. })));
    }

    #[test]
    fn test_nested_struct_offsets() {
        let graph = graph_of(
            r#"[
            {"kind": "struct", "name": "inner", "fields": [
                {"name": "a", "type": "int"}, {"name": "b", "type": "char"}]},
            {"kind": "struct", "name": "outer", "fields": [
                {"name": "i", "type": "inner"}, {"name": "z", "type": "int"}]}
        ]"#,
        );
        let inner = layout(&graph, "inner");
        assert_eq!(inner.size.as_u64(), 8);
        let outer = layout(&graph, "outer");
        assert_eq!(outer.offsets(), vec![0, 8]);
        assert_eq!(outer.size.as_u64(), 12);
    }
}
