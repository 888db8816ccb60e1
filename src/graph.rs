use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::metadata::Metadata;

/// A node of the metadata graph, keyed by its registry name (or the raw
/// token for references that did not resolve).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaNode {
    Substance(String),
    Liquid(String),
    Bottles(String),
    Animal(String),
    Phase(String),
}

/// How the source node feeds the target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// substance → liquid
    Solvent,
    /// substance → liquid
    Solute,
    /// liquid → bottles, at this side
    Side(u32),
    /// bottles → phase, in this cage
    Cage(u32),
    /// animal → phase
    Member,
}

/// Directed graph linking substances through liquids and bottles to
/// phases, and animals to the phases their partition takes part in.
pub struct MetadataGraph {
    graph: DiGraph<MetaNode, Link>,
    /// Map from node → NodeIndex for fast lookup.
    node_map: HashMap<MetaNode, NodeIndex>,
}

impl MetadataGraph {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut builder = Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        };

        for liquid in metadata.liquids.iter().flat_map(|l| l.values()) {
            let target = MetaNode::Liquid(liquid.name.clone());
            if let Some(solvent) = &liquid.solvent {
                let source = MetaNode::Substance(solvent.substance.name().to_string());
                builder.link(source, target.clone(), Link::Solvent);
            }
            for solute in liquid.solutes.iter() {
                let source = MetaNode::Substance(solute.substance.name().to_string());
                builder.link(source, target.clone(), Link::Solute);
            }
            builder.node(target);
        }

        for bottles in metadata.bottles.iter().flat_map(|b| b.values()) {
            let target = MetaNode::Bottles(bottles.name.clone());
            for (side, liquid) in &bottles.sides {
                let source = MetaNode::Liquid(liquid.name().to_string());
                builder.link(source, target.clone(), Link::Side(*side));
            }
            builder.node(target);
        }

        for animal in metadata.animals.iter().flat_map(|a| a.values()) {
            builder.node(MetaNode::Animal(animal.name.clone()));
        }

        for phase in metadata.phases.iter().flat_map(|p| p.values()) {
            let target = MetaNode::Phase(phase.name.clone());
            for (cage, bottles) in &phase.cages {
                let source = MetaNode::Bottles(bottles.name.clone());
                builder.link(source, target.clone(), Link::Cage(*cage));
            }
            for animal in phase.animals.iter().flat_map(|p| p.values()).flatten() {
                let source = MetaNode::Animal(animal.name.clone());
                builder.link(source, target.clone(), Link::Member);
            }
            builder.node(target);
        }

        builder
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, node: &MetaNode) -> bool {
        self.node_map.contains_key(node)
    }

    /// Phases whose cages hold a liquid containing `substance`.
    pub fn phases_exposed_to(&self, substance: &str) -> Vec<String> {
        let start = MetaNode::Substance(substance.to_lowercase());
        self.collect(&start, Direction::Outgoing, |node| match node {
            MetaNode::Phase(name) => Some(name.clone()),
            _ => None,
        })
    }

    /// Substances present in any liquid offered during `phase`.
    pub fn substances_in_phase(&self, phase: &str) -> Vec<String> {
        let start = MetaNode::Phase(phase.to_string());
        self.collect(&start, Direction::Incoming, |node| match node {
            MetaNode::Substance(name) => Some(name.clone()),
            _ => None,
        })
    }

    /// Animals of the partition assigned to `phase`.
    pub fn animals_in_phase(&self, phase: &str) -> Vec<String> {
        let start = MetaNode::Phase(phase.to_string());
        self.collect(&start, Direction::Incoming, |node| match node {
            MetaNode::Animal(name) => Some(name.clone()),
            _ => None,
        })
    }

    fn node(&mut self, node: MetaNode) -> NodeIndex {
        let graph = &mut self.graph;
        *self
            .node_map
            .entry(node)
            .or_insert_with_key(|n| graph.add_node(n.clone()))
    }

    fn link(&mut self, source: MetaNode, target: MetaNode, link: Link) {
        let source = self.node(source);
        let target = self.node(target);
        if !self
            .graph
            .edges_connecting(source, target)
            .any(|e| *e.weight() == link)
        {
            self.graph.add_edge(source, target, link);
        }
    }

    /// Sorted, deduplicated names of reachable nodes picked by `pick`.
    fn collect<F>(&self, start: &MetaNode, direction: Direction, pick: F) -> Vec<String>
    where
        F: Fn(&MetaNode) -> Option<String>,
    {
        let Some(&start) = self.node_map.get(start) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .reachable(start, direction)
            .into_iter()
            .filter_map(|idx| pick(&self.graph[idx]))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Find all nodes reachable from `start` following edges in `direction`.
    fn reachable(&self, start: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeIndex> = self.graph.neighbors_directed(start, direction).collect();
        let mut visited = HashSet::new();

        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            result.push(node);
            for neighbor in self.graph.neighbors_directed(node, direction) {
                if !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_substance_exposure() {
        let (_dir, metadata) = fixtures::load();
        let graph = metadata.graph();

        assert_eq!(
            graph.phases_exposed_to("sucrose"),
            vec!["Adaptation", "NP 1", "NP 1 (0)"]
        );
        assert_eq!(
            graph.phases_exposed_to("Saccharin"),
            vec!["Adaptation", "NP 1", "NP 1 (0)"]
        );
        assert!(graph.phases_exposed_to("quinine").is_empty());
    }

    #[test]
    fn test_phase_contents() {
        let (_dir, metadata) = fixtures::load();
        let graph = metadata.graph();

        assert_eq!(
            graph.substances_in_phase("NP 1"),
            vec!["saccharin", "sucrose", "water"]
        );
        assert_eq!(
            graph.animals_in_phase("NP 1"),
            vec!["Jerry", "Mickey", "Minnie", "Tom"]
        );
        assert!(graph.substances_in_phase("Phase 3").is_empty());
        assert!(graph.contains(&MetaNode::Phase("Phase 3".into())));
    }

    #[test]
    fn test_edges_are_not_duplicated() {
        let (_dir, metadata) = fixtures::load();
        let graph = metadata.graph();
        let rebuilt = MetadataGraph::from_metadata(&metadata);
        assert_eq!(graph.edge_count(), rebuilt.edge_count());

        // substances 3, liquids 3, bottles 2, animals 4, phases 4
        assert_eq!(graph.node_count(), 16);
    }

    #[test]
    fn test_empty_metadata() {
        let graph = MetadataGraph::from_metadata(&Metadata::default());
        assert_eq!(graph.node_count(), 0);
        assert!(graph.phases_exposed_to("water").is_empty());
    }
}
