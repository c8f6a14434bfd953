//! Path enumeration over a function's CFG (§4.F). A DFS from the entry node
//! that materializes every acyclic path; loops are visited exactly once per
//! path by treating a repeated node as a back-edge and escaping down its
//! false-edge successor.

use contract_abstract_ir::{IrGraph, NodeId};

pub fn enumerate_paths(graph: &IrGraph, entry: NodeId) -> Vec<Vec<NodeId>> {
    let mut out = Vec::new();
    let mut current = vec![entry];
    walk(graph, entry, &mut current, &mut out);
    out
}

fn walk(graph: &IrGraph, node_id: NodeId, current: &mut Vec<NodeId>, out: &mut Vec<Vec<NodeId>>) {
    let node = graph.node(node_id);
    if node.sons.is_empty() {
        out.push(current.clone());
        return;
    }
    for &succ in &node.sons {
        if current.contains(&succ) {
            follow_back_edge(graph, succ, current, out);
        } else {
            current.push(succ);
            walk(graph, succ, current, out);
            current.pop();
        }
    }
}

/// `succ` is already on the current path: append it once, then continue
/// exclusively down its false edge (son index 1) rather than re-entering the
/// loop body. A loop with no false edge simply ends the path there.
fn follow_back_edge(graph: &IrGraph, succ: NodeId, current: &mut Vec<NodeId>, out: &mut Vec<Vec<NodeId>>) {
    current.push(succ);
    let false_edge = graph.node(succ).sons.get(1).copied();
    match false_edge {
        Some(node) if !current.contains(&node) => {
            current.push(node);
            walk(graph, node, current, out);
            current.pop();
        }
        _ => out.push(current.clone()),
    }
    current.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_abstract_ir::IrGraphBuilder;

    #[test]
    fn straight_line_cfg_has_a_single_path() {
        let mut b = IrGraphBuilder::new();
        let n0 = b.push_node(vec![], vec![]);
        let n1 = b.reserve_node();
        b.fill_node(n1, vec![], vec![n0]);
        let graph = b.build();
        let paths = enumerate_paths(&graph, n1);
        assert_eq!(paths, vec![vec![n1, n0]]);
    }

    #[test]
    fn if_else_forks_into_two_paths() {
        let mut b = IrGraphBuilder::new();
        let then_n = b.push_node(vec![], vec![]);
        let else_n = b.push_node(vec![], vec![]);
        let head = b.reserve_node();
        b.fill_node(head, vec![], vec![then_n, else_n]);
        let graph = b.build();
        let paths = enumerate_paths(&graph, head);
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&vec![head, then_n]));
        assert!(paths.contains(&vec![head, else_n]));
    }

    #[test]
    fn loop_back_edge_is_visited_once_then_takes_false_exit() {
        let mut b = IrGraphBuilder::new();
        let exit = b.push_node(vec![], vec![]);
        let head = b.reserve_node();
        // head's true edge loops back to itself; false edge leaves the loop.
        b.fill_node(head, vec![], vec![head, exit]);
        let graph = b.build();
        let paths = enumerate_paths(&graph, head);
        // one path takes the false edge immediately (zero iterations), the
        // other revisits `head` once via the back-edge before escaping.
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&vec![head, exit]));
        assert!(paths.contains(&vec![head, head, exit]));
    }
}
