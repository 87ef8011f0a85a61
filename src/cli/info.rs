//! Informational commands (list, graph)

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::pipe::{PipeGraph, PipeId};
use crate::task::{TaskAction, TaskRegistry};
use std::process::ExitCode;

/// Print every task with its description and prerequisites.
pub fn run_list() -> ExitCode {
    let registry = match TaskRegistry::standard() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    print!("{}", format_task_list(&registry));
    ExitCode::from(EXIT_SUCCESS)
}

/// Print the pipe graph, or the part of it `pipe` needs.
pub fn run_graph(pipe: Option<&str>) -> ExitCode {
    let graph = match PipeGraph::new() {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let requested: Vec<PipeId> = match pipe {
        Some(name) => match PipeId::from_name(name) {
            Some(id) => vec![id],
            None => {
                eprintln!("Error: Unknown pipe '{}'", name);
                eprintln!("Known pipes: {}", PipeId::ALL.iter().map(|p| p.name()).collect::<Vec<_>>().join(", "));
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        },
        None => graph.pipes().collect(),
    };

    print!("{}", format_graph(&graph, &requested));
    ExitCode::from(EXIT_SUCCESS)
}

fn format_task_list(registry: &TaskRegistry) -> String {
    let width = registry.tasks().iter().map(|t| t.name.len()).max().unwrap_or(0);
    let mut out = String::new();

    for task in registry.tasks() {
        let action = match task.action {
            TaskAction::Pipe(pipe) => format!(" ({})", pipe),
            TaskAction::Clean(profile) => format!(" (clean {})", profile),
            TaskAction::Watch(profile) => format!(" (serve {})", profile),
            TaskAction::None => String::new(),
        };
        out.push_str(&format!("{:<width$}  {}{}\n", task.name, task.description, action, width = width));
        if !task.prerequisites.is_empty() {
            out.push_str(&format!("{:<width$}    after: {}\n", "", task.prerequisites.join(", "), width = width));
        }
    }

    out
}

fn format_graph(graph: &PipeGraph, requested: &[PipeId]) -> String {
    let mut out = String::new();
    for (i, level) in graph.levels(requested).iter().enumerate() {
        out.push_str(&format!("Level {}:\n", i));
        for pipe in level {
            let inputs = graph.inputs(*pipe);
            if inputs.is_empty() {
                out.push_str(&format!("  {}\n", pipe));
            } else {
                let names: Vec<&str> = inputs.iter().map(|p| p.name()).collect();
                out.push_str(&format!("  {} <- {}\n", pipe, names.join(", ")));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_list() {
        let registry = TaskRegistry::standard().unwrap();
        let list = format_task_list(&registry);
        assert!(list.lines().any(|l| l.starts_with("clean-build-app-prod") && l.contains("(built-app-prod)")));
        assert!(list.contains("after: clean-build-app-dev, validate-devserver-scripts"));
    }

    #[test]
    fn test_graph_for_one_pipe() {
        let graph = PipeGraph::new().unwrap();
        let text = format_graph(&graph, &[PipeId::BuiltAppScriptsProd]);
        assert_eq!(
            text,
            "Level 0:\n  validated-app-scripts\n  validated-partials\nLevel 1:\n  scripted-partials <- validated-partials\n\
             Level 2:\n  built-app-scripts-prod <- scripted-partials, validated-app-scripts\n"
        );
    }
}
