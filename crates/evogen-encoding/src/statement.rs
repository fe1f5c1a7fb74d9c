//! The closed statement enum and tree traversal.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Statement kind, used as the crossover compatibility key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    NumberLit,
    StringLit,
    BoolLit,
    Call,
    Construct,
}

/// One node of a genome tree.
///
/// Primitives are leaves; `Call` and `Construct` are "action" statements
/// whose arguments are nested statements. Ownership of the argument vector
/// makes cyclic self-references unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    NumberLit {
        id: u64,
        value: f64,
    },
    StringLit {
        id: u64,
        value: String,
    },
    BoolLit {
        id: u64,
        value: bool,
    },
    /// Call of an exported function.
    Call {
        id: u64,
        target: String,
        args: Vec<Statement>,
    },
    /// Construction of an exported class.
    Construct {
        id: u64,
        class: String,
        args: Vec<Statement>,
    },
}

impl Statement {
    pub fn number(value: f64) -> Self {
        Statement::NumberLit {
            id: fresh_node_id(),
            value,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Statement::StringLit {
            id: fresh_node_id(),
            value: value.into(),
        }
    }

    pub fn bool(value: bool) -> Self {
        Statement::BoolLit {
            id: fresh_node_id(),
            value,
        }
    }

    pub fn call(target: impl Into<String>, args: Vec<Statement>) -> Self {
        Statement::Call {
            id: fresh_node_id(),
            target: target.into(),
            args,
        }
    }

    pub fn construct(class: impl Into<String>, args: Vec<Statement>) -> Self {
        Statement::Construct {
            id: fresh_node_id(),
            class: class.into(),
            args,
        }
    }

    /// Stable unique node id within this tree.
    pub fn id(&self) -> u64 {
        match self {
            Statement::NumberLit { id, .. }
            | Statement::StringLit { id, .. }
            | Statement::BoolLit { id, .. }
            | Statement::Call { id, .. }
            | Statement::Construct { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::NumberLit { .. } => StatementKind::NumberLit,
            Statement::StringLit { .. } => StatementKind::StringLit,
            Statement::BoolLit { .. } => StatementKind::BoolLit,
            Statement::Call { .. } => StatementKind::Call,
            Statement::Construct { .. } => StatementKind::Construct,
        }
    }

    /// Whether this statement may serve as a genome root.
    pub fn is_action(&self) -> bool {
        matches!(self, Statement::Call { .. } | Statement::Construct { .. })
    }

    /// The export/class identity of an action statement.
    pub fn target_key(&self) -> Option<&str> {
        match self {
            Statement::Call { target, .. } => Some(target),
            Statement::Construct { class, .. } => Some(class),
            _ => None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn children(&self) -> &[Statement] {
        match self {
            Statement::Call { args, .. } | Statement::Construct { args, .. } => args,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [Statement] {
        match self {
            Statement::Call { args, .. } | Statement::Construct { args, .. } => args,
            _ => &mut [],
        }
    }

    /// Total nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Statement::node_count).sum::<usize>()
    }

    /// Height of this subtree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Statement::depth)
            .max()
            .unwrap_or(0)
    }

    /// Deep clone with fresh node ids throughout.
    pub fn deep_copy(&self) -> Statement {
        match self {
            Statement::NumberLit { value, .. } => Statement::number(*value),
            Statement::StringLit { value, .. } => Statement::string(value.clone()),
            Statement::BoolLit { value, .. } => Statement::bool(*value),
            Statement::Call { target, args, .. } => Statement::call(
                target.clone(),
                args.iter().map(Statement::deep_copy).collect(),
            ),
            Statement::Construct { class, args, .. } => Statement::construct(
                class.clone(),
                args.iter().map(Statement::deep_copy).collect(),
            ),
        }
    }

    /// Collect the ids of every node in the subtree (preorder).
    pub fn collect_ids(&self, out: &mut Vec<u64>) {
        out.push(self.id());
        for child in self.children() {
            child.collect_ids(out);
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::NumberLit { value, .. } => write!(f, "{value}"),
            Statement::StringLit { value, .. } => write!(f, "{value:?}"),
            Statement::BoolLit { value, .. } => write!(f, "{value}"),
            Statement::Call { target, args, .. } => {
                write!(f, "{target}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Statement::Construct { class, args, .. } => {
                write!(f, "new {class}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
