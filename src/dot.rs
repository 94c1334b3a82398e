//! Diagram to DOT (Graphviz) conversion.
//!
//! # DOT Format
//!
//! The generated DOT output follows these conventions:
//! - **Terminal nodes** (`|0|` and `|1|`) are rendered as squares at the bottom (sink rank)
//! - **Variable nodes** are rendered as circles, grouped by their variable
//! - **Edges** go from a node to the successor of each arc and are labelled
//!   with the arc valuation. Hierarchical arcs are labelled with the nested
//!   diagram and get an extra dotted edge to its root.
//! - **Root nodes** are rendered as rectangles at the top (source rank)
//!
//! # Examples
//!
//! ```
//! use sdd_rs::order::OrderBuilder;
//! use sdd_rs::sdd::Manager;
//! use sdd_rs::values::ValueSet;
//!
//! let mgr = Manager::init().unwrap();
//! let mut builder = OrderBuilder::new();
//! builder.push(1).push(0);
//! let order = builder.build().unwrap();
//! let a = mgr.create_with(&order, |id| ValueSet::singleton(id));
//!
//! let dot = mgr.to_dot(&[a]).unwrap();
//! assert!(dot.starts_with("digraph {"));
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::node::Valuation;
use crate::reference::Sdd;
use crate::sdd::Manager;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for variable nodes (default: "circle")
    pub node_shape: &'static str,
    /// Shape for terminal nodes (default: "square")
    pub terminal_shape: &'static str,
    /// Shape for root nodes (default: "rect")
    pub root_shape: &'static str,
    /// Style for arcs (default: "solid")
    pub arc_style: &'static str,
    /// Style for edges from hierarchical arcs to nested diagrams (default: "dotted")
    pub nested_style: &'static str,
    /// Whether to use HTML labels for subscripts (default: true)
    pub use_html_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            terminal_shape: "square",
            root_shape: "rect",
            arc_style: "solid",
            nested_style: "dotted",
            use_html_labels: true,
        }
    }
}

impl Manager {
    /// Nodes reachable from `roots` through successors and nested valuations.
    fn reachable(&self, roots: &[Sdd]) -> BTreeSet<Sdd> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<Sdd> = roots.iter().copied().filter(|r| !r.is_terminal()).collect();
        while let Some(sdd) = stack.pop() {
            if !seen.insert(sdd) {
                continue;
            }
            for (valuation, succ) in self.node(sdd).arcs.iter() {
                if let Valuation::Nested(nested) = valuation {
                    if !nested.is_terminal() {
                        stack.push(*nested);
                    }
                }
                if !succ.is_terminal() {
                    stack.push(*succ);
                }
            }
        }
        seen
    }

    /// Converts diagrams to DOT (Graphviz) format.
    ///
    /// All nodes reachable from `roots` are included, shared nodes once.
    pub fn to_dot(&self, roots: &[Sdd]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(roots, &DotConfig::default())
    }

    /// Converts diagrams to DOT format with custom configuration.
    ///
    /// ```
    /// use sdd_rs::dot::DotConfig;
    /// use sdd_rs::sdd::Manager;
    ///
    /// let mgr = Manager::init().unwrap();
    /// let config = DotConfig {
    ///     node_shape: "ellipse",
    ///     ..DotConfig::default()
    /// };
    /// let dot = mgr.to_dot_with_config(&[mgr.one()], &config).unwrap();
    /// assert!(dot.contains("ellipse"));
    /// ```
    pub fn to_dot_with_config(&self, roots: &[Sdd], config: &DotConfig) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        for &root in roots {
            self.check(root);
        }

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "0 [shape={}, label=\"|0|\"];", config.terminal_shape)?;
        writeln!(dot, "1 [shape={}, label=\"|1|\"];", config.terminal_shape)?;
        writeln!(dot, "}}")?;

        let all_nodes = self.reachable(roots);

        // Same variable, same rank.
        let mut levels = BTreeMap::<_, Vec<Sdd>>::new();
        for &sdd in all_nodes.iter() {
            levels.entry(self.node(sdd).var).or_default().push(sdd);
        }
        for (var, nodes) in levels.iter() {
            writeln!(dot, "{{ rank=same")?;
            for sdd in nodes {
                let label = if config.use_html_labels {
                    format!("<v<SUB>{}</SUB>>", var.index())
                } else {
                    format!("\"{}\"", var)
                };
                writeln!(dot, "{} [label={}];", sdd.index(), label)?;
            }
            writeln!(dot, "}}")?;
        }

        for &sdd in all_nodes.iter() {
            for (valuation, succ) in self.node(sdd).arcs.iter() {
                match valuation {
                    Valuation::Values(values) => {
                        writeln!(
                            dot,
                            "{} -> {} [label=\"{}\", style={}];",
                            sdd.index(),
                            succ.index(),
                            values,
                            config.arc_style
                        )?;
                    }
                    Valuation::Nested(nested) => {
                        writeln!(
                            dot,
                            "{} -> {} [label=\"{}\", style={}];",
                            sdd.index(),
                            succ.index(),
                            nested,
                            config.arc_style
                        )?;
                        writeln!(
                            dot,
                            "{} -> {} [style={}, arrowhead=odot];",
                            sdd.index(),
                            nested.index(),
                            config.nested_style
                        )?;
                    }
                }
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape={}, label=\"{}\"];", i, config.root_shape, root)?;
        }
        writeln!(dot, "}}")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} -> {};", i, root.index())?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::order::OrderBuilder;
    use crate::values::ValueSet;

    #[test]
    fn test_to_dot_basic() {
        let mgr = Manager::init().unwrap();
        let mut builder = OrderBuilder::new();
        builder.push(1).push(0);
        let order = builder.build().unwrap();
        let a = mgr.create_with(&order, |id| ValueSet::singleton(id));

        let dot = mgr.to_dot(&[a]).unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("label=\"{0}\""));
        assert!(dot.contains(&format!("r0 -> {};", a.index())));
    }

    #[test]
    fn test_to_dot_constants() {
        let mgr = Manager::init().unwrap();
        let dot = mgr.to_dot(&[mgr.zero(), mgr.one()]).unwrap();
        assert!(dot.contains("r0 -> 0;"));
        assert!(dot.contains("r1 -> 1;"));
    }

    #[test]
    fn test_to_dot_hierarchical() {
        let mgr = Manager::init().unwrap();
        let mut inner = OrderBuilder::new();
        inner.push(10);
        let mut builder = OrderBuilder::new();
        builder.push_nested(1, inner);
        let order = builder.build().unwrap();
        let a = mgr.create_with(&order, |_| ValueSet::singleton(3));

        let config = DotConfig {
            use_html_labels: false,
            ..DotConfig::default()
        };
        let dot = mgr.to_dot_with_config(&[a], &config).unwrap();
        assert!(dot.contains("arrowhead=odot"));
        assert!(dot.contains("label=\"{3}\""));
        assert!(!dot.contains("<SUB>"));
    }
}
