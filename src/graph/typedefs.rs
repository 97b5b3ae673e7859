// Tue Jul 21 2026 - Alex

use serde::{Deserialize, Serialize};

use crate::graph::error::BuildError;
use crate::graph::node::{TypeIdx, TypeKind, TypeNode};

/// Registry record for one alias: where its node sits, the final
/// (non-typedef) target the chain bottoms out at, and the hop count.
/// This is the cache that makes `resolve_typedef` O(1) after build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefEntry {
    pub alias: String,
    pub node: TypeIdx,
    pub target: TypeIdx,
    pub depth: u32,
}

/// Follows typedef links from `start` until a non-typedef node, with a
/// visited list so alias cycles are reported instead of looping. Returns the
/// final index and the number of hops taken.
pub(crate) fn resolve_chain(
    nodes: &[TypeNode],
    start: TypeIdx,
) -> Result<(TypeIdx, u32), BuildError> {
    let mut visited: Vec<TypeIdx> = Vec::new();
    let mut current = start;
    loop {
        let node = nodes.get(current.as_usize()).ok_or_else(|| BuildError::InvalidIndex {
            index: current,
            context: "typedef chain".to_string(),
        })?;
        match &node.kind {
            TypeKind::Typedef { target } => {
                if visited.contains(&current) {
                    let mut chain: Vec<String> =
                        visited.iter().map(|i| link_name(nodes, *i)).collect();
                    chain.push(link_name(nodes, current));
                    return Err(BuildError::TypedefCycle { chain });
                }
                visited.push(current);
                current = *target;
            }
            _ => return Ok((current, visited.len() as u32)),
        }
    }
}

fn link_name(nodes: &[TypeNode], idx: TypeIdx) -> String {
    nodes
        .get(idx.as_usize())
        .and_then(|n| n.name.clone())
        .unwrap_or_else(|| idx.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_resolves_with_depth() {
        // void <- myvoid <- myvoid2
        let nodes = vec![
            TypeNode::named("void", TypeKind::Void),
            TypeNode::named("myvoid", TypeKind::Typedef { target: TypeIdx::new(0) }),
            TypeNode::named("myvoid2", TypeKind::Typedef { target: TypeIdx::new(1) }),
        ];
        let (target, depth) = resolve_chain(&nodes, TypeIdx::new(2)).unwrap();
        assert_eq!(target, TypeIdx::new(0));
        assert_eq!(depth, 2);

        let (target, depth) = resolve_chain(&nodes, TypeIdx::new(0)).unwrap();
        assert_eq!(target, TypeIdx::new(0));
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_chain_reports_cycle() {
        let nodes = vec![
            TypeNode::named("a", TypeKind::Typedef { target: TypeIdx::new(1) }),
            TypeNode::named("b", TypeKind::Typedef { target: TypeIdx::new(0) }),
        ];
        let err = resolve_chain(&nodes, TypeIdx::new(0)).unwrap_err();
        match err {
            BuildError::TypedefCycle { chain } => {
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
