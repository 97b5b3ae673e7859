// Fri Jul 24 2026 - Alex

use std::fmt;

use serde::Serialize;

use crate::graph::node::{TypeIdx, TypeKind};
use crate::layout::engine::LayoutEngine;
use crate::layout::error::LayoutError;
use crate::layout::offset::Offset;

/// One hop while descending from a root type toward an offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum DescentStep {
    Field { name: String },
    Element { index: u64 },
}

impl fmt::Display for DescentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescentStep::Field { name } => write!(f, ".{name}"),
            DescentStep::Element { index } => write!(f, "[{index}]"),
        }
    }
}

/// A hop plus where it landed: the component's type and its offset inside
/// the immediately enclosing component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescentRecord {
    #[serde(flatten)]
    pub step: DescentStep,
    pub ty: TypeIdx,
    pub offset: Offset,
}

/// Renders a descent path the way a C expression would spell it, rooted at
/// an implicit variable: `.i.b`, `.arr[2]`, empty for the root itself.
pub fn path_string(path: &[DescentRecord]) -> String {
    path.iter().map(|r| r.step.to_string()).collect()
}

impl<'g> LayoutEngine<'g> {
    /// Walks from `root` to the innermost component containing `offset`.
    ///
    /// `Ok(None)` means the offset is past the end of the root. An empty
    /// path means no component below the root contains it: the root is a
    /// scalar, the offset fell into padding, or descent stopped at a union,
    /// whose overlapping members make any deeper choice ambiguous.
    pub fn component_containing(
        &self,
        root: TypeIdx,
        offset: Offset,
    ) -> Result<Option<Vec<DescentRecord>>, LayoutError> {
        let total = self.layout_of(root)?;
        if offset.as_u64() >= total.size.as_u64() {
            return Ok(None);
        }

        let mut path = Vec::new();
        let mut current = self.graph().resolve(root);
        let mut rel = offset.as_u64();
        loop {
            match &self.graph().node(current).kind {
                TypeKind::Struct { .. } => {
                    let info = self.layout_of(current)?;
                    let hit = info.fields.iter().find(|f| {
                        let start = f.offset.as_u64();
                        rel >= start && rel < start + f.size.as_u64()
                    });
                    match hit {
                        Some(field) => {
                            path.push(DescentRecord {
                                step: DescentStep::Field { name: field.name.clone() },
                                ty: field.ty,
                                offset: field.offset,
                            });
                            rel -= field.offset.as_u64();
                            current = self.graph().resolve(field.ty);
                        }
                        // Padding belongs to the struct itself.
                        None => return Ok(Some(path)),
                    }
                }
                TypeKind::Union { .. } => return Ok(Some(path)),
                TypeKind::Array { element, .. } => {
                    let elem = self.layout_of(*element)?;
                    let stride = elem.size.as_u64();
                    if stride == 0 {
                        return Ok(Some(path));
                    }
                    let index = rel / stride;
                    path.push(DescentRecord {
                        step: DescentStep::Element { index },
                        ty: *element,
                        offset: Offset::new(index * stride),
                    });
                    rel %= stride;
                    current = self.graph().resolve(*element);
                }
                _ => return Ok(Some(path)),
            }
        }
    }

    /// The most specific component whose first byte sits exactly at
    /// `offset`, as (type, path from root). Prefix starts along the
    /// containing path are non-decreasing, so the deepest prefix summing to
    /// `offset` is the answer; when none does the offset lands mid-scalar
    /// or in padding.
    pub fn component_at(
        &self,
        root: TypeIdx,
        offset: Offset,
    ) -> Result<Option<(TypeIdx, Vec<DescentRecord>)>, LayoutError> {
        let Some(full) = self.component_containing(root, offset)? else {
            return Ok(None);
        };
        let mut start = 0u64;
        let mut best = if offset.as_u64() == 0 { Some(0) } else { None };
        for (depth, record) in full.iter().enumerate() {
            start += record.offset.as_u64();
            if start == offset.as_u64() {
                best = Some(depth + 1);
            }
        }
        Ok(best.map(|depth| {
            let ty = match depth {
                0 => root,
                d => full[d - 1].ty,
            };
            (ty, full[..depth].to_vec())
        }))
    }

    /// Expands a root into its scalar leaves as (absolute offset, type)
    /// pairs, in address order. Arrays are unrolled element by element.
    /// Unions are kept whole since their members share the same bytes.
    pub fn flatten(&self, root: TypeIdx) -> Result<Vec<(Offset, TypeIdx)>, LayoutError> {
        let mut leaves = Vec::new();
        self.flatten_into(root, 0, &mut leaves)?;
        Ok(leaves)
    }

    fn flatten_into(
        &self,
        idx: TypeIdx,
        base: u64,
        leaves: &mut Vec<(Offset, TypeIdx)>,
    ) -> Result<(), LayoutError> {
        let resolved = self.graph().resolve(idx);
        match &self.graph().node(resolved).kind {
            TypeKind::Struct { .. } => {
                let info = self.layout_of(resolved)?;
                for field in &info.fields {
                    self.flatten_into(field.ty, base + field.offset.as_u64(), leaves)?;
                }
            }
            TypeKind::Array { element, .. } => {
                let info = self.layout_of(resolved)?;
                let elem = self.layout_of(*element)?;
                let stride = elem.size.as_u64();
                if stride == 0 {
                    return Ok(());
                }
                let count = info.size.as_u64() / stride;
                for i in 0..count {
                    self.flatten_into(*element, base + i * stride, leaves)?;
                }
            }
            _ => leaves.push((Offset::new(base), resolved)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclFeed;
    use crate::graph::builder::GraphBuilder;
    use crate::graph::arena::TypeGraph;
    use crate::layout::target::TargetModel;

    fn graph_of(json: &str) -> TypeGraph {
        let feed = DeclFeed::from_json_str("test", json).unwrap();
        let out = GraphBuilder::from_feeds(&[feed]).build();
        assert!(out.is_clean(), "build errors: {:?}", out.errors);
        out.graph
    }

    const NESTED: &str = r#"[
        {"kind": "struct", "name": "inner", "fields": [
            {"name": "a", "type": "int"}, {"name": "b", "type": "char"}]},
        {"kind": "struct", "name": "outer", "fields": [
            {"name": "i", "type": "inner"}, {"name": "z", "type": "int"}]}
    ]"#;

    #[test]
    fn test_containing_descends_through_nesting() {
        let graph = graph_of(NESTED);
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("outer").unwrap();

        let path = engine
            .component_containing(root, Offset::new(4))
            .unwrap()
            .unwrap();
        assert_eq!(path_string(&path), ".i.b");
        assert_eq!(path[1].ty, graph.lookup("char").unwrap());
    }

    #[test]
    fn test_containing_stops_in_padding() {
        let graph = graph_of(NESTED);
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("inner").unwrap();

        // inner is {int a; char b; pad..8}; byte 6 is padding.
        let path = engine
            .component_containing(root, Offset::new(6))
            .unwrap()
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_containing_rejects_out_of_range() {
        let graph = graph_of(NESTED);
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("outer").unwrap();
        assert_eq!(engine.component_containing(root, Offset::new(12)).unwrap(), None);
    }

    #[test]
    fn test_containing_indexes_arrays() {
        let graph = graph_of(
            r#"[{"kind": "struct", "name": "s", "fields": [
                {"name": "pad", "type": "char"},
                {"name": "arr", "type": "int[4]"}]}]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("s").unwrap();

        let path = engine
            .component_containing(root, Offset::new(13))
            .unwrap()
            .unwrap();
        assert_eq!(path_string(&path), ".arr[2]");
        assert_eq!(path[0].offset, Offset::new(4));
        assert_eq!(path[1].offset, Offset::new(8));
    }

    #[test]
    fn test_containing_keeps_unions_opaque() {
        let graph = graph_of(
            r#"[
            {"kind": "union", "name": "u", "fields": [
                {"name": "n", "type": "int"}, {"name": "buf", "type": "char[8]"}]},
            {"kind": "struct", "name": "s", "fields": [
                {"name": "x", "type": "u"}, {"name": "y", "type": "int"}]}
        ]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("s").unwrap();

        let path = engine
            .component_containing(root, Offset::new(2))
            .unwrap()
            .unwrap();
        assert_eq!(path_string(&path), ".x");
    }

    #[test]
    fn test_component_at_picks_deepest_start() {
        let graph = graph_of(NESTED);
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("outer").unwrap();

        let (ty, path) = engine.component_at(root, Offset::new(0)).unwrap().unwrap();
        assert_eq!(path_string(&path), ".i.a");
        assert_eq!(ty, graph.lookup("int").unwrap());

        let (ty, path) = engine.component_at(root, Offset::new(8)).unwrap().unwrap();
        assert_eq!(path_string(&path), ".z");
        assert_eq!(ty, graph.lookup("int").unwrap());
    }

    #[test]
    fn test_component_at_misses_interior_bytes() {
        let graph = graph_of(NESTED);
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("outer").unwrap();
        assert_eq!(engine.component_at(root, Offset::new(2)).unwrap(), None);
    }

    #[test]
    fn test_flatten_lists_leaves_in_address_order() {
        let graph = graph_of(NESTED);
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("outer").unwrap();

        let leaves = engine.flatten(root).unwrap();
        let int_idx = graph.lookup("int").unwrap();
        let char_idx = graph.lookup("char").unwrap();
        assert_eq!(
            leaves,
            vec![
                (Offset::new(0), int_idx),
                (Offset::new(4), char_idx),
                (Offset::new(8), int_idx),
            ]
        );
    }

    #[test]
    fn test_flatten_unrolls_arrays_and_skips_into_typedefs() {
        let graph = graph_of(
            r#"[
            {"kind": "typedef", "name": "pair_t", "target": "short[2]"},
            {"kind": "struct", "name": "s", "fields": [
                {"name": "p", "type": "pair_t"}, {"name": "tail", "type": "char"}]}
        ]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("s").unwrap();

        let leaves = engine.flatten(root).unwrap();
        let short_idx = graph.lookup("short").unwrap();
        let char_idx = graph.lookup("char").unwrap();
        assert_eq!(
            leaves,
            vec![
                (Offset::new(0), short_idx),
                (Offset::new(2), short_idx),
                (Offset::new(4), char_idx),
            ]
        );
    }

    #[test]
    fn test_flatten_keeps_union_whole() {
        let graph = graph_of(
            r#"[
            {"kind": "union", "name": "u", "fields": [
                {"name": "n", "type": "int"}, {"name": "d", "type": "double"}]},
            {"kind": "struct", "name": "s", "fields": [
                {"name": "head", "type": "char"}, {"name": "body", "type": "u"}]}
        ]"#,
        );
        let engine = LayoutEngine::new(&graph, TargetModel::lp64());
        let root = graph.lookup("s").unwrap();

        let leaves = engine.flatten(root).unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[1].0, Offset::new(8));
        assert_eq!(leaves[1].1, graph.lookup("u").unwrap());
    }
}
