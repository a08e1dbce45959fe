use std::process::ExitCode;
use unpage_core::{Config, Graph};

pub fn run(config: &Config, identifier: &str, json: bool) -> ExitCode {
    let path = config.snapshot_path();
    let graph = match Graph::load(&path) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Build the graph first with: unpage graph build");
            return ExitCode::FAILURE;
        }
    };

    let Some(node) = graph.find_node(identifier) else {
        println!("No node found for identifier '{}'", identifier);
        return ExitCode::FAILURE;
    };

    let identifiers = graph.identifiers_of(&node.node_id);
    let outgoing = graph.outgoing_edges(&node.node_id);
    let incoming = graph.incoming_edges(&node.node_id);

    if json {
        let value = serde_json::json!({
            "node": node,
            "identifiers": identifiers,
            "outgoing_edges": outgoing,
            "incoming_edges": incoming,
        });
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("Node: {}", node.node_id);
    println!("Type: {}", node.node_type);
    for (key, value) in &node.context {
        println!("  {}: {}", key, value);
    }

    println!();
    println!("Identifiers ({}):", identifiers.len());
    for id in &identifiers {
        println!("  {}", id);
    }

    println!();
    println!("Outgoing edges ({}):", outgoing.len());
    for edge in &outgoing {
        println!("  --{}--> {}", edge.relationship_type(), edge.target_node_id);
    }

    println!();
    println!("Incoming edges ({}):", incoming.len());
    for edge in &incoming {
        println!("  <--{}-- {}", edge.relationship_type(), edge.source_node_id);
    }

    ExitCode::SUCCESS
}
