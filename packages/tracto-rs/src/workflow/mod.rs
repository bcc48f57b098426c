//! Thin workflow layer: a named DAG of tool-wrapping nodes with named
//! ports, executed in topological order with one subprocess per node.

pub mod node;

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::process::Stdio;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, Topo};
use petgraph::Direction;

use crate::error::{Result, TractoError};
use crate::tools;

pub use node::{derived_name, input_path, IdentityInterface, Interface, Invocation, PortMap, PortValue};

struct Node {
    name: String,
    interface: Box<dyn Interface>,
    /// Values preset on the node before execution (workflow inputs,
    /// literal parameters such as the DSI matrix path)
    presets: PortMap,
}

#[derive(Debug, Clone)]
struct Connection {
    src_port: String,
    dst_port: String,
}

/// A directed acyclic graph of processing nodes.
///
/// Invariants: node names are unique, every connected port is declared by
/// the node's interface, and the graph stays acyclic (offending edges are
/// rejected at connect time).
pub struct Workflow {
    name: String,
    graph: DiGraph<Node, Connection>,
    indices: HashMap<String, NodeIndex>,
}

impl Workflow {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            graph: DiGraph::new(),
            indices: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_node<I: Interface + 'static>(&mut self, name: &str, interface: I) -> Result<()> {
        if self.indices.contains_key(name) {
            return Err(TractoError::DuplicateNode(name.to_string()));
        }
        let idx = self.graph.add_node(Node {
            name: name.to_string(),
            interface: Box::new(interface),
            presets: PortMap::new(),
        });
        self.indices.insert(name.to_string(), idx);
        Ok(())
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].name.as_str())
            .collect()
    }

    fn index_of(&self, name: &str) -> Result<NodeIndex> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| TractoError::UnknownNode(name.to_string()))
    }

    fn check_port(&self, idx: NodeIndex, port: &str, output: bool) -> Result<()> {
        let node = &self.graph[idx];
        let ports = if output {
            node.interface.output_ports()
        } else {
            node.interface.input_ports()
        };
        if !ports.contains(&port) {
            return Err(TractoError::UnknownPort {
                node: node.name.clone(),
                port: port.to_string(),
            });
        }
        Ok(())
    }

    /// Preset a value on a node's input port (workflow inputs and literal
    /// parameters).
    pub fn set_input(&mut self, node: &str, port: &str, value: PortValue) -> Result<()> {
        let idx = self.index_of(node)?;
        self.check_port(idx, port, false)?;
        self.graph[idx].presets.insert(port.to_string(), value);
        Ok(())
    }

    /// Wire `src`'s output port to `dst`'s input port.
    pub fn connect(&mut self, src: &str, src_port: &str, dst: &str, dst_port: &str) -> Result<()> {
        let src_idx = self.index_of(src)?;
        let dst_idx = self.index_of(dst)?;
        self.check_port(src_idx, src_port, true)?;
        self.check_port(dst_idx, dst_port, false)?;

        let edge = self.graph.add_edge(
            src_idx,
            dst_idx,
            Connection {
                src_port: src_port.to_string(),
                dst_port: dst_port.to_string(),
            },
        );
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(TractoError::CycleDetected {
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }
        Ok(())
    }

    /// True when an edge `src.src_port -> dst.dst_port` exists.
    pub fn is_connected(&self, src: &str, src_port: &str, dst: &str, dst_port: &str) -> bool {
        let (Ok(src_idx), Ok(dst_idx)) = (self.index_of(src), self.index_of(dst)) else {
            return false;
        };
        self.graph
            .edges_connecting(src_idx, dst_idx)
            .any(|e| e.weight().src_port == src_port && e.weight().dst_port == dst_port)
    }

    fn topological_order(&self) -> Vec<NodeIndex> {
        let mut topo = Topo::new(&self.graph);
        let mut order = Vec::new();
        while let Some(idx) = topo.next(&self.graph) {
            order.push(idx);
        }
        order
    }

    /// Execute the workflow under `work_dir` and return the output node's
    /// resolved port values. Nodes run in topological order, each in its
    /// own `<work_dir>/<flow>/<node>/` directory.
    pub async fn run(&self, work_dir: &Path) -> Result<PortMap> {
        let mut produced: HashMap<(NodeIndex, String), PortValue> = HashMap::new();
        let mut last_outputs = PortMap::new();

        for idx in self.topological_order() {
            let node = &self.graph[idx];
            let mut inputs = node.presets.clone();
            for edge in self.graph.edges_directed(idx, Direction::Incoming) {
                let conn = edge.weight();
                if let Some(value) = produced.get(&(edge.source(), conn.src_port.clone())) {
                    inputs.insert(conn.dst_port.clone(), value.clone());
                }
            }

            let node_dir = work_dir.join(&self.name).join(&node.name);
            tokio::fs::create_dir_all(&node_dir).await?;

            if let Some(invocation) = node.interface.plan(&inputs, &node_dir)? {
                node.interface.prepare(&node_dir)?;
                execute(&node.name, &invocation, &node_dir).await?;
            }

            let outputs = node.interface.outputs(&inputs, &node_dir)?;
            verify_outputs(node.interface.name(), &outputs)?;
            for (port, value) in &outputs {
                produced.insert((idx, port.clone()), value.clone());
            }
            if node.name == "outputnode" {
                last_outputs = outputs;
            }
        }

        Ok(last_outputs)
    }

    /// Render the graph in DOT format for inspection.
    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph {} {{", self.name);
        for idx in self.graph.node_indices() {
            let _ = writeln!(dot, "    \"{}\";", self.graph[idx].name);
        }
        for edge in self.graph.edge_references() {
            let conn = edge.weight();
            let _ = writeln!(
                dot,
                "    \"{}\" -> \"{}\" [label=\"{} -> {}\"];",
                self.graph[edge.source()].name,
                self.graph[edge.target()].name,
                conn.src_port,
                conn.dst_port
            );
        }
        dot.push_str("}\n");
        dot
    }
}

async fn execute(node_name: &str, invocation: &Invocation, node_dir: &Path) -> Result<()> {
    let program = tools::resolve_program(&invocation.program);
    log::info!(
        "[{}] {} {}",
        node_name,
        program.display(),
        invocation.args.join(" ")
    );

    let mut command = tokio::process::Command::new(&program);
    command.args(&invocation.args).current_dir(node_dir);

    if let Some(ref stdin_path) = invocation.stdin_from {
        let file = std::fs::File::open(stdin_path).map_err(|e| TractoError::ExecutionFailed {
            tool: invocation.program.clone(),
            detail: format!("cannot open stdin file {}: {}", stdin_path.display(), e),
        })?;
        command.stdin(Stdio::from(file));
    }
    if let Some(ref stdout_path) = invocation.stdout_to {
        let file =
            std::fs::File::create(stdout_path).map_err(|e| TractoError::ExecutionFailed {
                tool: invocation.program.clone(),
                detail: format!("cannot create output file {}: {}", stdout_path.display(), e),
            })?;
        command.stdout(Stdio::from(file));
    }
    command.stderr(Stdio::piped());

    let output = command
        .output()
        .await
        .map_err(|e| TractoError::ExecutionFailed {
            tool: invocation.program.clone(),
            detail: format!("failed to spawn: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::error!("[{}] failed with {}: {}", node_name, output.status, stderr);
        return Err(TractoError::ExecutionFailed {
            tool: invocation.program.clone(),
            detail: format!("status {}. stderr: {}", output.status, stderr.trim()),
        });
    }
    Ok(())
}

/// Every declared path output must exist once the node has run.
fn verify_outputs(tool: &str, outputs: &PortMap) -> Result<()> {
    for value in outputs.values() {
        if let PortValue::Path(path) = value {
            if !path.exists() {
                return Err(TractoError::OutputMissing {
                    tool: tool.to_string(),
                    path: path.display().to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test interface invoking `touch` to create its single output.
    struct TouchInterface {
        out_name: &'static str,
    }

    impl Interface for TouchInterface {
        fn name(&self) -> &'static str {
            "touch"
        }

        fn input_ports(&self) -> &[&'static str] {
            &["in_file"]
        }

        fn output_ports(&self) -> &[&'static str] {
            &["out_file"]
        }

        fn plan(&self, _inputs: &PortMap, _work_dir: &Path) -> Result<Option<Invocation>> {
            Ok(Some(Invocation::new("touch", [self.out_name])))
        }

        fn outputs(&self, _inputs: &PortMap, work_dir: &Path) -> Result<PortMap> {
            let mut map = PortMap::new();
            map.insert(
                "out_file".to_string(),
                PortValue::Path(work_dir.join(self.out_name)),
            );
            Ok(map)
        }
    }

    fn identity_flow() -> Workflow {
        let mut flow = Workflow::new("test");
        flow.add_node("inputnode", IdentityInterface::new(&["a", "b"]))
            .unwrap();
        flow.add_node("outputnode", IdentityInterface::new(&["a", "b"]))
            .unwrap();
        flow
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut flow = identity_flow();
        let err = flow
            .add_node("inputnode", IdentityInterface::new(&["x"]))
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_unknown_port_rejected() {
        let mut flow = identity_flow();
        let err = flow
            .connect("inputnode", "missing", "outputnode", "a")
            .unwrap_err();
        assert!(matches!(err, TractoError::UnknownPort { .. }));
    }

    #[test]
    fn test_unknown_node_rejected() {
        let mut flow = identity_flow();
        let err = flow.connect("nope", "a", "outputnode", "a").unwrap_err();
        assert!(matches!(err, TractoError::UnknownNode(_)));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut flow = Workflow::new("test");
        flow.add_node("a", IdentityInterface::new(&["x"])).unwrap();
        flow.add_node("b", IdentityInterface::new(&["x"])).unwrap();
        flow.connect("a", "x", "b", "x").unwrap();
        let err = flow.connect("b", "x", "a", "x").unwrap_err();
        assert!(matches!(err, TractoError::CycleDetected { .. }));
        // The offending edge was rolled back
        assert!(!flow.is_connected("b", "x", "a", "x"));
    }

    #[test]
    fn test_preset_requires_declared_port() {
        let mut flow = identity_flow();
        assert!(flow
            .set_input("inputnode", "a", PortValue::Flag(true))
            .is_ok());
        assert!(flow
            .set_input("inputnode", "zz", PortValue::Flag(true))
            .is_err());
    }

    #[tokio::test]
    async fn test_identity_values_flow_through() {
        let tmp = tempfile::tempdir().unwrap();
        let mut flow = identity_flow();
        flow.connect("inputnode", "a", "outputnode", "a").unwrap();
        flow.set_input("inputnode", "a", PortValue::Text("hello".to_string()))
            .unwrap();
        flow.set_input("outputnode", "b", PortValue::Flag(true))
            .unwrap();

        let outputs = flow.run(tmp.path()).await.unwrap();
        assert_eq!(
            outputs.get("a"),
            Some(&PortValue::Text("hello".to_string()))
        );
        assert_eq!(outputs.get("b"), Some(&PortValue::Flag(true)));
    }

    #[tokio::test]
    async fn test_command_node_runs_and_publishes_output() {
        let tmp = tempfile::tempdir().unwrap();
        let mut flow = Workflow::new("touchflow");
        flow.add_node("inputnode", IdentityInterface::new(&["in"]))
            .unwrap();
        flow.add_node("toucher", TouchInterface { out_name: "made.txt" })
            .unwrap();
        flow.add_node("outputnode", IdentityInterface::new(&["result"]))
            .unwrap();
        flow.connect("inputnode", "in", "toucher", "in_file").unwrap();
        flow.connect("toucher", "out_file", "outputnode", "result")
            .unwrap();
        flow.set_input("inputnode", "in", PortValue::path("/dev/null"))
            .unwrap();

        let outputs = flow.run(tmp.path()).await.unwrap();
        let result = outputs.get("result").and_then(PortValue::as_path).unwrap();
        assert!(result.exists());
        assert!(result.ends_with("touchflow/toucher/made.txt"));
    }

    #[tokio::test]
    async fn test_failing_command_surfaces_stderr() {
        struct FailingInterface;
        impl Interface for FailingInterface {
            fn name(&self) -> &'static str {
                "false"
            }
            fn input_ports(&self) -> &[&'static str] {
                &[]
            }
            fn output_ports(&self) -> &[&'static str] {
                &["out"]
            }
            fn plan(&self, _: &PortMap, _: &Path) -> Result<Option<Invocation>> {
                Ok(Some(Invocation::new("false", Vec::<String>::new())))
            }
            fn outputs(&self, _: &PortMap, work_dir: &Path) -> Result<PortMap> {
                let mut map = PortMap::new();
                map.insert("out".to_string(), PortValue::Path(work_dir.join("x")));
                Ok(map)
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let mut flow = Workflow::new("failflow");
        flow.add_node("failer", FailingInterface).unwrap();
        let err = flow.run(tmp.path()).await.unwrap_err();
        assert!(matches!(err, TractoError::ExecutionFailed { .. }));
    }

    #[test]
    fn test_dot_export() {
        let mut flow = identity_flow();
        flow.connect("inputnode", "a", "outputnode", "a").unwrap();
        let dot = flow.to_dot();
        assert!(dot.starts_with("digraph test {"));
        assert!(dot.contains("\"inputnode\" -> \"outputnode\" [label=\"a -> a\"]"));
    }
}
