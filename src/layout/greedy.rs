//! Starting assignments: the shuffled baseline and the degree/centrality greedy

use rand::seq::SliceRandom;
use rand::Rng;

use crate::graph::Graph;

use super::lattice::Lattice;
use super::types::Assignment;

/// Seeded uniform random assignment, used as the reference baseline
pub fn random_assignment<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Assignment {
    let mut slots: Vec<usize> = (0..n).collect();
    slots.shuffle(rng);
    // A shuffle of 0..n is always a permutation.
    Assignment::from_slots(slots).unwrap_or_else(|| Assignment::identity(n))
}

/// Entities ordered by degree (descending), ties by entity id (ascending)
pub fn degree_order(graph: &Graph) -> Vec<usize> {
    let mut order: Vec<usize> = (0..graph.len()).collect();
    order.sort_by(|&a, &b| {
        graph
            .degree(b)
            .cmp(&graph.degree(a))
            .then_with(|| graph.id(a).cmp(&graph.id(b)))
    });
    order
}

/// Give the k-th most connected entity the k-th most central slot
pub fn greedy_assignment(graph: &Graph, lattice: &Lattice) -> Assignment {
    let mut slots = vec![0usize; graph.len()];
    for (entity, slot) in degree_order(graph).into_iter().zip(lattice.by_centrality()) {
        slots[entity] = slot;
    }
    Assignment::from_slots(slots).unwrap_or_else(|| Assignment::identity(graph.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphInput;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_degree_order_ties_by_id() {
        // star around 30, leaves 10/20/40 all degree 1
        let graph = GraphInput::from_pairs([40, 10, 30, 20], &[(30, 10), (30, 20), (30, 40)])
            .to_graph()
            .unwrap();
        let order: Vec<u64> = degree_order(&graph)
            .into_iter()
            .map(|i| graph.id(i).0)
            .collect();
        assert_eq!(order, vec![30, 10, 20, 40]);
    }

    #[test]
    fn test_path_puts_inner_node_in_center() {
        let graph = GraphInput::from_pairs(1..=4, &[(1, 2), (2, 3), (3, 4)])
            .to_graph()
            .unwrap();
        assert_eq!(graph.degrees(), vec![1, 2, 2, 1]);

        let lattice = Lattice::generate(4, 80.0);
        let assignment = greedy_assignment(&graph, &lattice);
        let center = assignment.inverse()[0];
        assert_eq!(graph.degree(center), 2);
        assert_eq!(graph.id(center).0, 2);
        assert!(assignment.is_bijection());
    }

    #[test]
    fn test_greedy_is_bijection() {
        let pairs: Vec<(u64, u64)> = (0..60).map(|i| (i % 17, (i * 7 + 3) % 50)).collect();
        let graph = GraphInput::from_pairs(0..50, &pairs).to_graph().unwrap();
        let lattice = Lattice::generate(50, 80.0);
        let assignment = greedy_assignment(&graph, &lattice);
        assert_eq!(assignment.len(), 50);
        assert!(assignment.is_bijection());
    }

    #[test]
    fn test_random_assignment_seeded() {
        let a = random_assignment(100, &mut StdRng::seed_from_u64(42));
        let b = random_assignment(100, &mut StdRng::seed_from_u64(42));
        let c = random_assignment(100, &mut StdRng::seed_from_u64(43));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_bijection());
    }
}
