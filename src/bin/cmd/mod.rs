// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod dump;
mod inspect;
mod record;

pub use dump::DumpCmd;
pub use inspect::InspectCmd;
pub use record::RecordCmd;
