//! Story Graph, the engine behind branching, choose-your-path stories.
//!
//! Interprets a story document as a directed graph of segments and
//! choices, checks its structure, counts its distinct endings, tracks a
//! reader's progress through it, and lays it out as a tree for external
//! renderers. The engine performs no I/O; hosts decode documents and
//! persist progress records themselves.

pub mod core;
pub mod schema;
