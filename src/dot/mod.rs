use std::{collections::BTreeMap, fs, path::Path};

use itertools::Itertools;
use log::debug;
use tabbycat::{AttrList, Edge, GraphBuilder, GraphType, Identity, StmtList};

use super::{Dfa, Error, Result};

const ENTRY_NODE: &str = "entry";

fn render_error(error: impl ToString) -> Error {
    Error::Render(error.to_string())
}

fn id(name: impl Into<String>) -> Result<Identity> {
    Identity::id(name).map_err(render_error)
}

impl Dfa {
    /// Graphviz digraph of the DFA. Nodes are named `s0`, `s1`, ... in discovery
    /// order and labelled with their NFA states; parallel edges are merged into
    /// one edge labelled with every symbol.
    pub fn to_dot(&self) -> Result<String> {
        let name = |index: usize| format!("s{}", index);

        let mut edges = BTreeMap::<(usize, usize), Vec<&str>>::new();
        for (from, symbol, to) in self.transitions() {
            if let (Some(from), Some(to)) = (self.states.get_index_of(from), self.states.get_index_of(to)) {
                edges.entry((from, to)).or_default().push(symbol);
            }
        }
        let edges: Vec<((usize, usize), String)> = edges
            .into_iter()
            .map(|(ends, symbols)| (ends, symbols.into_iter().join(", ")))
            .collect();

        let mut stmts = StmtList::new().add_node(
            id(ENTRY_NODE)?,
            None,
            Some(AttrList::new().add_pair((id("shape")?, id("point")?))),
        );

        for (index, state) in self.states().enumerate() {
            let shape = match self.is_accepting(state) {
                true => "doublecircle",
                false => "circle",
            };
            let attrs = AttrList::new()
                .add_pair((id("label")?, Identity::quoted(Dfa::state_label(state))))
                .add_pair((id("shape")?, id(shape)?));

            stmts = stmts.add_node(id(name(index))?, None, Some(attrs));
        }

        if let Some(start) = self.states.get_index_of(&self.start_state) {
            stmts = stmts.add_edge(
                Edge::head_node(id(ENTRY_NODE)?, None).arrow_to_node(id(name(start))?, None),
            );
        }

        for ((from, to), label) in edges {
            stmts = stmts.add_edge(
                Edge::head_node(id(name(from))?, None)
                    .arrow_to_node(id(name(to))?, None)
                    .add_attrpair((id("label")?, Identity::quoted(label))),
            );
        }

        let graph = GraphBuilder::default()
            .graph_type(GraphType::DiGraph)
            .strict(false)
            .id(id("dfa")?)
            .stmts(stmts)
            .build()
            .map_err(render_error)?;

        Ok(graph.to_string())
    }

    pub fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_dot()?)?;
        debug!("wrote DFA graph to {}", path.display());
        Ok(())
    }
}
