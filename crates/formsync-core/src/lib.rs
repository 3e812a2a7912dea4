//! FormSync Core - Domain types for answer reconciliation
//!
//! This crate contains the value types shared by the reconciliation engine:
//! - **Answer values** - `AnswerValue`, a tagged union for dynamically-typed answers
//! - **Snapshots** - `FormState`, one session's view of a form's answers
//! - **Conflicts** - `Conflict`, `Resolution`, and their classification enums
//! - **Newtypes** - validated identifiers (`FormId`, `FieldId`, `ConflictId`)
//!
//! The domain module contains pure data with no engine logic; the
//! `formsync-reconcile` crate builds detection and resolution on top of it.

pub mod domain;
