// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Table rewriting.
//!
//! - [`synchronizer`] - Rewrite a table through a temporary copy
//! - [`editable`] - In-memory edit buffer flushed by a rewrite

pub mod editable;
pub mod synchronizer;

pub use editable::EditableLayer;
pub use synchronizer::{synchronize, SyncStats};
