// Sat Jul 25 2026 - Alex

use ahash::AHashSet;
use log::trace;

use crate::equiv::error::{CompareError, Side};
use crate::equiv::flags::CompareFlags;
use crate::equiv::path::{DivergePath, PathStep};
use crate::equiv::report::{Divergence, EquivalenceResult, MismatchKind};
use crate::graph::arena::TypeGraph;
use crate::graph::node::{TypeIdx, TypeKind};
use crate::layout::engine::LayoutEngine;
use crate::layout::target::TargetModel;

/// Lock-step structural comparison of two type graphs. Provenance-blind:
/// either side may come from the declaration builder or straight from a
/// debug-info dump, the walk only sees the arena shape.
pub struct EquivalenceEngine<'g> {
    left: LayoutEngine<'g>,
    right: LayoutEngine<'g>,
    flags: CompareFlags,
}

/// State for one comparison walk. `visited` is the co-inductive assumption
/// set: a pair already in flight is taken as equivalent, which is what makes
/// the walk terminate on self-referential types. It also bounds the walk by
/// the product of the two arena sizes.
struct Walk {
    visited: AHashSet<(TypeIdx, TypeIdx)>,
    path: Vec<PathStep>,
    divergence: Option<Divergence>,
}

impl Walk {
    fn new() -> Self {
        Self { visited: AHashSet::new(), path: Vec::new(), divergence: None }
    }

    fn diverged(&self) -> bool {
        self.divergence.is_some()
    }

    fn record(&mut self, kind: MismatchKind, left: String, right: String) {
        if self.divergence.is_none() {
            self.divergence = Some(Divergence {
                path: DivergePath(self.path.clone()),
                kind,
                left,
                right,
            });
        }
    }
}

impl<'g> EquivalenceEngine<'g> {
    pub fn new(
        left: &'g TypeGraph,
        right: &'g TypeGraph,
        target: TargetModel,
        flags: CompareFlags,
    ) -> Self {
        Self {
            left: LayoutEngine::new(left, target),
            right: LayoutEngine::new(right, target),
            flags,
        }
    }

    pub fn flags(&self) -> CompareFlags {
        self.flags
    }

    /// Compares the type named `name` on both sides.
    pub fn compare_named(&self, name: &str) -> Result<EquivalenceResult, CompareError> {
        let a = self.left.graph().lookup(name).ok_or_else(|| CompareError::RootNotFound {
            side: Side::Left,
            name: name.to_string(),
        })?;
        let b = self.right.graph().lookup(name).ok_or_else(|| CompareError::RootNotFound {
            side: Side::Right,
            name: name.to_string(),
        })?;
        self.compare(a, b)
    }

    /// Compares one pair of roots. The first divergence along the
    /// depth-first, declaration-order walk is reported; equivalence is the
    /// absence of any. Layout cross-checking failures surface as errors,
    /// never as a verdict.
    pub fn compare(&self, a: TypeIdx, b: TypeIdx) -> Result<EquivalenceResult, CompareError> {
        let mut walk = Walk::new();
        self.step(a, b, &mut walk)?;
        Ok(EquivalenceResult {
            divergences: walk.divergence.into_iter().collect(),
        })
    }

    fn step(&self, a: TypeIdx, b: TypeIdx, walk: &mut Walk) -> Result<(), CompareError> {
        if walk.diverged() {
            return Ok(());
        }
        // Typedefs are transparent: `int_t` on one side matches `int` on
        // the other. Alias chains are acyclic in assembled graphs.
        let a = self.left.graph().resolve(a);
        let b = self.right.graph().resolve(b);
        if !walk.visited.insert((a, b)) {
            trace!("assumed equivalent (in flight): {} / {}", a, b);
            return Ok(());
        }

        let lg = self.left.graph();
        let rg = self.right.graph();
        let na = lg.node(a);
        let nb = rg.node(b);

        match (&na.kind, &nb.kind) {
            (TypeKind::Void, TypeKind::Void) => {}
            (TypeKind::Primitive { prim: pa }, TypeKind::Primitive { prim: pb }) => {
                let target = self.left.target();
                if pa.class() != pb.class() {
                    walk.record(
                        MismatchKind::KindTag,
                        format!("{} ({:?})", pa, pa.class()).to_lowercase(),
                        format!("{} ({:?})", pb, pb.class()).to_lowercase(),
                    );
                } else if target.primitive_size(*pa) != target.primitive_size(*pb) {
                    walk.record(
                        MismatchKind::PrimitiveWidth,
                        format!("{} ({} bytes)", pa, target.primitive_size(*pa)),
                        format!("{} ({} bytes)", pb, target.primitive_size(*pb)),
                    );
                } else if pa.is_signed() != pb.is_signed() {
                    walk.record(
                        MismatchKind::PrimitiveSignedness,
                        pa.to_string(),
                        pb.to_string(),
                    );
                }
            }
            (TypeKind::Pointer { pointee: ta }, TypeKind::Pointer { pointee: tb }) => {
                walk.path.push(PathStep::Pointee);
                self.step(*ta, *tb, walk)?;
                walk.path.pop();
            }
            (
                TypeKind::Array { element: ea, count: ca },
                TypeKind::Array { element: eb, count: cb },
            ) => {
                if ca != cb {
                    walk.record(MismatchKind::ElementCount, ca.to_string(), cb.to_string());
                } else {
                    walk.path.push(PathStep::Element);
                    self.step(*ea, *eb, walk)?;
                    walk.path.pop();
                }
            }
            (TypeKind::Struct { .. }, TypeKind::Struct { .. })
            | (TypeKind::Union { .. }, TypeKind::Union { .. }) => {
                self.step_fields(a, b, walk)?;
            }
            (TypeKind::Enum { members: ma }, TypeKind::Enum { members: mb }) => {
                let same_values = ma.len() == mb.len()
                    && ma.iter().map(|m| m.value).eq(mb.iter().map(|m| m.value));
                let same_names = ma.len() == mb.len()
                    && ma.iter().map(|m| &m.name).eq(mb.iter().map(|m| &m.name));
                let strict = self.flags.contains(CompareFlags::REQUIRE_FIELD_NAMES);
                if !same_values || (strict && !same_names) {
                    walk.record(
                        MismatchKind::EnumMembers,
                        render_enum(ma),
                        render_enum(mb),
                    );
                }
            }
            (
                TypeKind::FunctionSignature { returns: ra, params: pa, variadic: va },
                TypeKind::FunctionSignature { returns: rb, params: pb, variadic: vb },
            ) => {
                if pa.len() != pb.len() {
                    walk.record(
                        MismatchKind::ParamCount,
                        pa.len().to_string(),
                        pb.len().to_string(),
                    );
                } else if va != vb {
                    walk.record(MismatchKind::Variadic, va.to_string(), vb.to_string());
                } else {
                    walk.path.push(PathStep::Return);
                    self.step(*ra, *rb, walk)?;
                    walk.path.pop();
                    for (i, (qa, qb)) in pa.iter().zip(pb.iter()).enumerate() {
                        if walk.diverged() {
                            break;
                        }
                        walk.path.push(PathStep::Param { index: i });
                        self.step(*qa, *qb, walk)?;
                        walk.path.pop();
                    }
                }
            }
            _ => {
                walk.record(
                    MismatchKind::KindTag,
                    format!("{} ({})", lg.display_name(a), na.kind.kind_name()),
                    format!("{} ({})", rg.display_name(b), nb.kind.kind_name()),
                );
            }
        }
        Ok(())
    }

    /// Struct/struct or union/union pair. Fields pair positionally; strict
    /// mode additionally requires names, distinguishing a reordering of the
    /// same name set from a plain rename.
    fn step_fields(&self, a: TypeIdx, b: TypeIdx, walk: &mut Walk) -> Result<(), CompareError> {
        let fa = self.left.graph().node(a).kind.fields().unwrap_or(&[]);
        let fb = self.right.graph().node(b).kind.fields().unwrap_or(&[]);

        if fa.len() != fb.len() {
            walk.record(MismatchKind::FieldCount, fa.len().to_string(), fb.len().to_string());
            return Ok(());
        }

        if self.flags.contains(CompareFlags::REQUIRE_FIELD_NAMES) {
            for (i, (la, lb)) in fa.iter().zip(fb.iter()).enumerate() {
                if la.name != lb.name {
                    let mut names_a: Vec<&str> = fa.iter().map(|f| f.name.as_str()).collect();
                    let mut names_b: Vec<&str> = fb.iter().map(|f| f.name.as_str()).collect();
                    names_a.sort_unstable();
                    names_b.sort_unstable();
                    let kind = if names_a == names_b {
                        MismatchKind::FieldOrder
                    } else {
                        MismatchKind::FieldName
                    };
                    walk.path.push(PathStep::Field {
                        index: i,
                        left: la.name.clone(),
                        right: lb.name.clone(),
                    });
                    walk.record(kind, la.name.clone(), lb.name.clone());
                    walk.path.pop();
                    return Ok(());
                }
            }
        }

        for (i, (la, lb)) in fa.iter().zip(fb.iter()).enumerate() {
            if walk.diverged() {
                break;
            }
            walk.path.push(PathStep::Field {
                index: i,
                left: la.name.clone(),
                right: lb.name.clone(),
            });
            self.step(la.ty, lb.ty, walk)?;
            walk.path.pop();
        }

        if !walk.diverged() && self.flags.contains(CompareFlags::CHECK_LAYOUT) {
            self.check_layout(a, b, walk)?;
        }
        Ok(())
    }

    /// Cross-checks the two computed layouts for an aggregate pair. Only
    /// runs after the shapes already matched, so field counts agree.
    fn check_layout(&self, a: TypeIdx, b: TypeIdx, walk: &mut Walk) -> Result<(), CompareError> {
        let la = self.left.layout_of(a)?;
        let lb = self.right.layout_of(b)?;
        if la.size != lb.size {
            walk.record(MismatchKind::Size, la.size.to_string(), lb.size.to_string());
        } else if la.align != lb.align {
            walk.record(MismatchKind::Alignment, la.align.to_string(), lb.align.to_string());
        } else {
            for (i, (pa, pb)) in la.fields.iter().zip(lb.fields.iter()).enumerate() {
                if pa.offset != pb.offset {
                    walk.path.push(PathStep::Field {
                        index: i,
                        left: pa.name.clone(),
                        right: pb.name.clone(),
                    });
                    walk.record(
                        MismatchKind::FieldOffset,
                        pa.offset.to_string(),
                        pb.offset.to_string(),
                    );
                    walk.path.pop();
                    break;
                }
            }
        }
        Ok(())
    }
}

fn render_enum(members: &[crate::graph::node::EnumMember]) -> String {
    let inner: Vec<String> =
        members.iter().map(|m| format!("{}={}", m.name, m.value)).collect();
    format!("{{{}}}", inner.join(", "))
}
