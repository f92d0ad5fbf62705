// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Full-table rewrite.
//!
//! A schema change that the on-disk layout cannot absorb is applied by
//! writing a complete new table next to the original and swapping it in:
//!
//! 1. `<path>.tmp` is created with the original's encoding and geometry
//!    columns ([`TableLayer::create_for_rewrite`]).
//! 2. `build` creates the columns, `replay` copies the features.
//! 3. The original is closed and the temporary file renamed over it
//!    (a file already at the destination is kept as `.bak` until the rename
//!    succeeded).
//! 4. The new table replaces the original in place.
//!
//! Any failure before step 3 completes deletes the temporary files and
//! leaves the original table open and unchanged.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::core::Result;
use crate::table::{path_with_suffix, TableLayer};

/// Statistics from a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Columns created on the new table
    pub field_count: u64,
    /// Features copied to the new table
    pub feature_count: u64,
}

impl SyncStats {
    /// Create a new empty statistics struct.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rewrite `table` through a temporary copy and swap it in.
///
/// `build(source, target)` creates the columns of the new table and returns
/// how many it created; `replay(source, target)` copies the features and
/// returns how many it copied.
pub fn synchronize<T, B, R>(table: &mut T, build: B, replay: R) -> Result<SyncStats>
where
    T: TableLayer,
    B: FnOnce(&T, &mut T) -> Result<u64>,
    R: FnOnce(&mut T, &mut T) -> Result<u64>,
{
    let final_path = table.base().filename().to_path_buf();
    let tmp_path = path_with_suffix(&final_path, ".tmp");
    debug!(
        context = "synchronize",
        table = %table.name(),
        tmp = %tmp_path.display(),
        "Starting table rewrite"
    );

    let mut target = match table.create_for_rewrite(&tmp_path) {
        Ok(target) => target,
        Err(e) => {
            remove_files(&[tmp_path]);
            return Err(e);
        }
    };

    let copied = build(table, &mut target).and_then(|field_count| {
        replay(table, &mut target).map(|feature_count| SyncStats {
            field_count,
            feature_count,
        })
    });
    let stats = match copied {
        Ok(stats) => stats,
        Err(e) => {
            warn!(context = "synchronize", table = %table.name(), error = %e, "Rewrite failed, original kept");
            discard(target);
            table.reset_reading();
            return Err(e);
        }
    };

    if let Err(e) = table.close() {
        warn!(context = "synchronize", table = %table.name(), error = %e, "Cannot close original table");
    }
    table.base_mut().close_file();
    if let Err(e) = target.rename_file_to(&final_path) {
        warn!(context = "synchronize", table = %table.name(), error = %e, "Cannot replace original file");
        discard(target);
        table.base_mut().reopen()?;
        return Err(e);
    }

    *table = target;
    info!(
        context = "synchronize",
        table = %table.name(),
        path = %final_path.display(),
        fields = stats.field_count,
        features = stats.feature_count,
        "Table rewritten"
    );
    Ok(stats)
}

fn discard<T: TableLayer>(target: T) {
    let files = target.file_list();
    drop(target);
    remove_files(&files);
}

fn remove_files(files: &[PathBuf]) {
    for file in files {
        if file.exists() {
            if let Err(e) = fs::remove_file(file) {
                warn!(context = "synchronize", path = %file.display(), error = %e, "Cannot remove temporary file");
            }
        }
    }
}
