//! Append-only log of structural mutations
//!
//! Records serialize one per line:
//!
//! ```text
//! AddVertex,<id>
//! RemoveVertex,<id>
//! AddEdge,<from>,<to>,<weight>
//! RemoveEdge,<from>,<to>
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult, ParseReason};
use crate::graph::GraphMutator;
use crate::import::split_lines;
use crate::model::VertexId;

/// One structural command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    AddVertex(VertexId),
    RemoveVertex(VertexId),
    AddEdge { from: VertexId, to: VertexId, weight: f32 },
    RemoveEdge { from: VertexId, to: VertexId },
}

impl Action {
    /// Apply through the normal mutation path so every invariant is re-checked.
    pub fn apply<G: GraphMutator + ?Sized>(&self, graph: &mut G) -> GraphResult<()> {
        match *self {
            Action::AddVertex(id) => graph.add_vertex(id),
            Action::RemoveVertex(id) => graph.remove_vertex(id),
            Action::AddEdge { from, to, weight } => graph.add_edge(from, to, weight),
            Action::RemoveEdge { from, to } => graph.remove_edge(from, to),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AddVertex(id) => write!(f, "AddVertex,{id}"),
            Action::RemoveVertex(id) => write!(f, "RemoveVertex,{id}"),
            Action::AddEdge { from, to, weight } => write!(f, "AddEdge,{from},{to},{weight}"),
            Action::RemoveEdge { from, to } => write!(f, "RemoveEdge,{from},{to}"),
        }
    }
}

impl FromStr for Action {
    type Err = ParseReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.trim().split(',').map(str::trim);
        let command = fields.next().unwrap_or_default();

        let action = match command {
            "AddVertex" => Action::AddVertex(id_field(fields.next(), "id")?),
            "RemoveVertex" => Action::RemoveVertex(id_field(fields.next(), "id")?),
            "AddEdge" => {
                let from = id_field(fields.next(), "from")?;
                let to = id_field(fields.next(), "to")?;
                let raw = fields.next().ok_or(ParseReason::MissingField("weight"))?;
                let weight = raw
                    .parse::<f32>()
                    .map_err(|_| ParseReason::InvalidNumber(raw.to_string()))?;
                Action::AddEdge { from, to, weight }
            }
            "RemoveEdge" => Action::RemoveEdge {
                from: id_field(fields.next(), "from")?,
                to: id_field(fields.next(), "to")?,
            },
            other => return Err(ParseReason::UnknownCommand(other.to_string())),
        };

        match fields.next() {
            Some(extra) => Err(ParseReason::TrailingField(extra.to_string())),
            None => Ok(action),
        }
    }
}

fn id_field(raw: Option<&str>, name: &'static str) -> Result<VertexId, ParseReason> {
    let raw = raw.ok_or(ParseReason::MissingField(name))?;
    raw.parse::<i64>()
        .map(VertexId)
        .map_err(|_| ParseReason::InvalidNumber(raw.to_string()))
}

/// Ordered, append-only record of successful mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    actions: Vec<Action>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions
    }

    /// Render every record, one per line, each terminated by `\n`.
    pub fn to_text(&self) -> String {
        self.actions.iter().map(|a| format!("{a}\n")).collect()
    }

    /// Parse a textual log. Blank lines are skipped; any malformed record
    /// rejects the whole text since a partial log would replay differently.
    pub fn from_text(text: &str) -> GraphResult<Self> {
        let mut log = ActionLog::new();
        for (i, line) in split_lines(text).into_iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let action = line
                .parse::<Action>()
                .map_err(|reason| GraphError::Parse { line: i + 1, reason })?;
            log.push(action);
        }
        Ok(log)
    }
}

impl FromIterator<Action> for ActionLog {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        ActionLog {
            actions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ActionLog {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
