//! PlantUML diagram generation

use std::fmt::Debug;
use std::fmt::Write;
use std::hash::Hash;

use crate::fsm::TransitionRecord;
use crate::hierarchy::Hierarchy;

/// Generate a PlantUML state diagram: composite states nest their substates,
/// recorded transitions become arrows and the active state is highlighted.
pub fn generate_plantuml<'a, S, I>(
    hierarchy: &Hierarchy<S>,
    transitions: I,
    current: Option<&S>,
) -> String
where
    S: Clone + Debug + Eq + Hash + 'a,
    I: IntoIterator<Item = &'a TransitionRecord<S>>,
{
    let mut plantuml = String::new();
    plantuml.push_str("@startuml\n");
    plantuml.push_str("skinparam state {\n");
    plantuml.push_str("  BackgroundColor<<Current>> YellowGreen\n");
    plantuml.push_str("}\n\n");

    write_state(&mut plantuml, hierarchy, hierarchy.top(), 0);
    plantuml.push('\n');

    // HashMap order is arbitrary, keep the output stable
    let mut arrows: Vec<String> = transitions
        .into_iter()
        .map(|record| format!("{:?} --> {:?} : {}\n", record.from, record.to, record.trigger))
        .collect();
    arrows.sort();
    for arrow in arrows {
        plantuml.push_str(&arrow);
    }

    if let Some(current) = current {
        let _ = writeln!(plantuml, "state {:?} <<Current>>", current);
    }

    plantuml.push_str("@enduml\n");
    plantuml
}

fn write_state<S>(out: &mut String, hierarchy: &Hierarchy<S>, state: &S, indent: usize)
where
    S: Clone + Debug + Eq + Hash,
{
    let pad = "  ".repeat(indent);
    let name = hierarchy.name(state).unwrap_or_default();
    let substates: Vec<&S> = hierarchy.substates(state).collect();

    if substates.is_empty() {
        let _ = writeln!(out, "{}state \"{}\" as {:?}", pad, name, state);
        return;
    }

    let _ = writeln!(out, "{}state \"{}\" as {:?} {{", pad, name, state);
    for substate in substates {
        write_state(out, hierarchy, substate, indent + 1);
    }
    let _ = writeln!(out, "{}}}", pad);
}
