//! Stack graph (DAG) for deployment planning.
//!
//! Holds the declared stacks, validates the wiring between them eagerly, and
//! precomputes a deterministic topological order for execution.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::error::GraphError;

/// A named handle a stack consumes from one of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputBinding {
    /// Name the consuming stack knows the handle by
    pub name: String,
    /// Stack that produces the handle
    pub producer: String,
    /// Output name on the producing stack
    pub output: String,
}

/// One logical stack in the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackNode {
    name: String,
    dependencies: Vec<String>,
    inputs: Vec<InputBinding>,
    outputs: Vec<String>,
}

impl StackNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Builder: add dependencies (duplicates are ignored)
    pub fn depends_on<I, S>(mut self, stacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for stack in stacks {
            let stack = stack.into();
            if !self.dependencies.contains(&stack) {
                self.dependencies.push(stack);
            }
        }
        self
    }

    /// Builder: consume `producer.output` under the local name `name`
    pub fn consumes(
        mut self,
        name: impl Into<String>,
        producer: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        self.inputs.push(InputBinding {
            name: name.into(),
            producer: producer.into(),
            output: output.into(),
        });
        self
    }

    /// Builder: declare produced outputs
    pub fn produces<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(outputs.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn inputs(&self) -> &[InputBinding] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn depends_on_stack(&self, stack: &str) -> bool {
        self.dependencies.iter().any(|d| d == stack)
    }

    pub fn declares_output(&self, output: &str) -> bool {
        self.outputs.iter().any(|o| o == output)
    }
}

/// A validated directed acyclic graph of stacks.
#[derive(Debug, Clone)]
pub struct StackGraph {
    /// Nodes in declaration order
    nodes: Vec<StackNode>,
    /// name -> index into `nodes`
    index: HashMap<String, usize>,
    /// Execution order as indices into `nodes`
    order: Vec<usize>,
}

impl StackGraph {
    /// Validate the declared nodes and build the graph.
    ///
    /// All structural checks run here, before anything is executed.
    pub fn from_nodes(nodes: Vec<StackNode>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name.clone(), i).is_some() {
                return Err(GraphError::DuplicateStack {
                    stack: node.name.clone(),
                });
            }
        }

        for node in &nodes {
            for dep in &node.dependencies {
                if !index.contains_key(dep) {
                    return Err(GraphError::UnknownDependency {
                        stack: node.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }

            for input in &node.inputs {
                if !node.depends_on_stack(&input.producer) {
                    return Err(GraphError::InputNotFromDependency {
                        stack: node.name.clone(),
                        input: input.name.clone(),
                        producer: input.producer.clone(),
                    });
                }
                let producer = &nodes[index[&input.producer]];
                if !producer.declares_output(&input.output) {
                    return Err(GraphError::UnknownOutput {
                        stack: node.name.clone(),
                        producer: input.producer.clone(),
                        output: input.output.clone(),
                    });
                }
            }
        }

        let order = topological_sort(&nodes, &index)?;

        Ok(Self {
            nodes,
            index,
            order,
        })
    }

    /// Nodes in declaration order
    pub fn nodes(&self) -> &[StackNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&StackNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Nodes in execution order (every node after all of its dependencies)
    pub fn topological_order(&self) -> impl Iterator<Item = &StackNode> {
        self.order.iter().map(move |&i| &self.nodes[i])
    }

    /// Stack names in execution order
    pub fn order_names(&self) -> Vec<String> {
        self.topological_order()
            .map(|n| n.name.clone())
            .collect()
    }
}

/// Kahn's algorithm; among ready nodes the earliest declared goes first.
fn topological_sort(
    nodes: &[StackNode],
    index: &HashMap<String, usize>,
) -> Result<Vec<usize>, GraphError> {
    let mut in_degree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (i, node) in nodes.iter().enumerate() {
        for dep in &node.dependencies {
            dependents[index[dep]].push(i);
            in_degree[i] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != nodes.len() {
        let done: HashSet<usize> = order.into_iter().collect();
        let stacks = (0..nodes.len())
            .filter(|i| !done.contains(i))
            .map(|i| nodes[i].name.clone())
            .collect();
        return Err(GraphError::Cycle { stacks });
    }

    Ok(order)
}
