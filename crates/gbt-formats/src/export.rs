//! Register export table.
//!
//! One row per occupied step carrying the register values of all three
//! channels, plus how many steps the row lasts before the next change.

use std::collections::BTreeSet;
use std::fmt;

use gbt_ir::{encode, Song, TrackRole};

/// One row of the export table.
///
/// Channels without a note at the row's step hold zeros.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportRow {
    pub step: u32,
    pub swp1: u16,
    pub env1: u16,
    pub frq1: u16,
    pub env2: u16,
    pub frq2: u16,
    pub env4: u16,
    pub frq4: u16,
    /// Steps covered by this row, the silent steps after it included
    pub run_length: u32,
}

impl ExportRow {
    pub fn is_rest(&self) -> bool {
        self.frq1 == 0 && self.frq2 == 0 && self.frq4 == 0
    }

    /// The eight exported values in table order.
    pub fn fields(&self) -> [u32; 8] {
        [
            self.swp1 as u32,
            self.env1 as u32,
            self.frq1 as u32,
            self.env2 as u32,
            self.frq2 as u32,
            self.env4 as u32,
            self.frq4 as u32,
            self.run_length,
        ]
    }
}

impl fmt::Display for ExportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, value) in self.fields().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "0x{:04X}", value)?;
        }
        f.write_str("}")
    }
}

/// Build the export rows for `song`.
///
/// A silent lead-in before the first note becomes an all-zero rest row.
pub fn export_rows(song: &Song) -> Vec<ExportRow> {
    let occupied: BTreeSet<u32> = TrackRole::ALL
        .iter()
        .flat_map(|&role| song.track(role).iter().map(|(step, _)| step))
        .collect();
    let end = song.end_step();

    let mut rows = Vec::with_capacity(occupied.len() + 1);
    let first = occupied.first().copied().unwrap_or(end);
    if first > 0 {
        rows.push(ExportRow { step: 0, run_length: first, ..Default::default() });
    }

    let mut steps = occupied.iter().copied().peekable();
    while let Some(step) = steps.next() {
        let next = steps.peek().copied().unwrap_or(end);
        let mut row = ExportRow { step, run_length: next - step, ..Default::default() };
        if let Some(note) = song.note(TrackRole::SquareSweep, step) {
            let regs = encode(note);
            row.swp1 = regs.swp.unwrap_or(0);
            row.env1 = regs.env;
            row.frq1 = regs.frq;
        }
        if let Some(note) = song.note(TrackRole::Square, step) {
            let regs = encode(note);
            row.env2 = regs.env;
            row.frq2 = regs.frq;
        }
        if let Some(note) = song.note(TrackRole::Noise, step) {
            let regs = encode(note);
            row.env4 = regs.env;
            row.frq4 = regs.frq;
        }
        rows.push(row);
    }
    rows
}

/// The export table as text, one row per line.
pub fn export_table(song: &Song) -> String {
    export_rows(song)
        .iter()
        .map(ExportRow::to_string)
        .collect::<Vec<_>>()
        .join(",\n")
}
