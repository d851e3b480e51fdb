use thiserror::Error;

/// Structural misuse of the node hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A node was asked to become its own parent.
    #[error("a layout node cannot be its own parent")]
    SelfParent,
    /// The requested parent is a descendant of the node.
    #[error("reparenting would create a cycle: the new parent is a descendant")]
    Cycle,
}
