//! The pipe dependency graph.
//!
//! Validated for acyclicity when constructed. Given a set of requested pipes,
//! the graph yields their transitive closure grouped into levels: every pipe's
//! inputs sit in earlier levels, so a level can run in parallel.

use super::PipeId;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Circular dependency detected involving pipe '{0}'")]
    Cycle(PipeId),

    #[error("Pipe '{pipe}' reads '{input}', which is not part of the graph")]
    UnknownInput { pipe: PipeId, input: PipeId },
}

#[derive(Debug, Clone)]
pub struct PipeGraph {
    edges: BTreeMap<PipeId, Vec<PipeId>>,
}

impl PipeGraph {
    /// The graph of every pipe, wired by `PipeId::inputs`.
    pub fn new() -> Result<Self, GraphError> {
        Self::from_edges(PipeId::ALL.iter().map(|id| (*id, id.inputs().to_vec())))
    }

    /// Build a graph from explicit `(pipe, inputs)` pairs.
    pub fn from_edges(edges: impl IntoIterator<Item = (PipeId, Vec<PipeId>)>) -> Result<Self, GraphError> {
        let graph = Self { edges: edges.into_iter().collect() };

        for (pipe, inputs) in &graph.edges {
            if let Some(input) = inputs.iter().find(|i| !graph.edges.contains_key(i)) {
                return Err(GraphError::UnknownInput { pipe: *pipe, input: *input });
            }
        }

        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();
        let mut order = Vec::new();
        for pipe in graph.edges.keys() {
            graph.visit(*pipe, &mut visited, &mut visiting, &mut order)?;
        }

        Ok(graph)
    }

    fn visit(
        &self,
        pipe: PipeId,
        visited: &mut HashSet<PipeId>,
        visiting: &mut HashSet<PipeId>,
        order: &mut Vec<PipeId>,
    ) -> Result<(), GraphError> {
        if visited.contains(&pipe) {
            return Ok(());
        }
        if !visiting.insert(pipe) {
            return Err(GraphError::Cycle(pipe));
        }

        for input in self.inputs(pipe) {
            self.visit(*input, visited, visiting, order)?;
        }

        visiting.remove(&pipe);
        visited.insert(pipe);
        order.push(pipe);
        Ok(())
    }

    pub fn inputs(&self, pipe: PipeId) -> &[PipeId] {
        self.edges.get(&pipe).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pipes(&self) -> impl Iterator<Item = PipeId> + '_ {
        self.edges.keys().copied()
    }

    /// Requested pipes plus everything they transitively read, inputs first.
    pub fn closure(&self, requested: &[PipeId]) -> Vec<PipeId> {
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();
        let mut order = Vec::new();
        for pipe in requested {
            // Acyclic by construction.
            let _ = self.visit(*pipe, &mut visited, &mut visiting, &mut order);
        }
        order
    }

    /// The closure of `requested`, grouped into dependency levels.
    pub fn levels(&self, requested: &[PipeId]) -> Vec<Vec<PipeId>> {
        let pipes = self.closure(requested);
        let mut level_of: BTreeMap<PipeId, usize> = BTreeMap::new();

        // `closure` lists inputs before their consumers.
        for pipe in &pipes {
            let level = self.inputs(*pipe).iter().filter_map(|i| level_of.get(i)).map(|l| l + 1).max().unwrap_or(0);
            level_of.insert(*pipe, level);
        }

        let depth = level_of.values().copied().max().map_or(0, |m| m + 1);
        let mut levels: Vec<BTreeSet<PipeId>> = vec![BTreeSet::new(); depth];
        for (pipe, level) in level_of {
            levels[level].insert(pipe);
        }
        levels.into_iter().map(|l| l.into_iter().collect()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipeId::*;

    #[test]
    fn test_standard_graph_is_acyclic() {
        let graph = PipeGraph::new().unwrap();
        assert_eq!(graph.pipes().count(), PipeId::ALL.len());
    }

    #[test]
    fn test_cycle_detected() {
        let err = PipeGraph::from_edges(vec![
            (ValidatedIndex, vec![BuiltIndexDev]),
            (BuiltIndexDev, vec![ValidatedIndex]),
        ])
        .unwrap_err();
        assert!(matches!(err, GraphError::Cycle(_)));
    }

    #[test]
    fn test_unknown_input() {
        let err = PipeGraph::from_edges(vec![(BuiltPartialsDev, vec![ValidatedPartials])]).unwrap_err();
        assert_eq!(err, GraphError::UnknownInput { pipe: BuiltPartialsDev, input: ValidatedPartials });
    }

    #[test]
    fn test_closure_inputs_first() {
        let graph = PipeGraph::new().unwrap();
        let closure = graph.closure(&[BuiltAppScriptsProd]);
        assert_eq!(closure.len(), 4);
        assert_eq!(closure.last(), Some(&BuiltAppScriptsProd));
        let pos = |p| closure.iter().position(|x| *x == p).unwrap();
        assert!(pos(ValidatedPartials) < pos(ScriptedPartials));
    }

    #[test]
    fn test_levels_for_prod_app() {
        let graph = PipeGraph::new().unwrap();
        let levels = graph.levels(&[BuiltAppProd]);

        assert_eq!(levels.len(), 5);
        assert!(levels[0].contains(&ValidatedAppScripts));
        assert!(levels[0].contains(&ValidatedPartials));
        assert!(levels[0].contains(&ProcessedImagesProd));
        assert_eq!(levels[1], vec![ScriptedPartials]);
        assert_eq!(levels[2], vec![BuiltAppScriptsProd]);
        assert_eq!(levels[3], vec![BuiltIndexProd]);
        assert_eq!(levels[4], vec![BuiltAppProd]);
    }

    #[test]
    fn test_levels_never_mix_profiles_needlessly() {
        let graph = PipeGraph::new().unwrap();
        let all: Vec<PipeId> = graph.levels(&[BuiltAppDev]).into_iter().flatten().collect();
        assert!(!all.contains(&BuiltAppScriptsProd));
        assert!(all.contains(&BuiltPartialsDev));
    }
}
