//! Row-pulse interception
//!
//! The appliance scans its keypad by pulsing the row lines low one after
//! another and sampling the columns. A falling edge on row 1 starts a scan.
//! To fake a closed switch the armed column has to mirror the pulse of the
//! key's row, so each row gets its own hand-timed protocol:
//!
//! ```text
//! row 0: col low; wait row1 high; col high
//! row 1: wait row2 low; col low; wait row2 high; col high
//! row 2: wait row3 high; col high; wait row3 low; col low
//! row 3: wait row3 high and row1 high; col high; wait row3 low; col low
//! ```
//!
//! Everything here runs in the real-time context: it only reads the
//! [`KeySlot`] snapshot, polls [`ScanLines`] and writes the column latch.

use hpbridge_hal::{RowLine, ScanLines};

use super::slot::KeySlot;

/// Polls before a wait is abandoned; several full scan periods at 125 MHz
pub const DEFAULT_SPIN_LIMIT: u32 = 200_000;

/// What a call to [`intercept_row_pulse`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseOutcome {
    /// No key armed
    Idle,
    /// Row 1 was already back high, the edge was seen too late
    Stale,
    /// Column pulsed in step with the scan
    Pulsed,
    /// Scan stopped mid-protocol; column put back to its idle level
    TimedOut,
}

/// Level the armed column rests at between pulses
///
/// Rows 0 and 1 pulse the column low, rows 2 and 3 pulse it high.
pub fn column_idle_high(row: u8) -> bool {
    row < 2
}

#[inline(always)]
fn spin_while<L: ScanLines>(lines: &L, limit: u32, mut busy: impl FnMut(&L) -> bool) -> bool {
    let mut polls = 0u32;
    while busy(lines) {
        polls += 1;
        if polls >= limit {
            return false;
        }
        core::hint::spin_loop();
    }
    true
}

/// Answer one row-1 falling edge
pub fn intercept_row_pulse<L: ScanLines>(slot: &KeySlot, lines: &mut L, spin_limit: u32) -> PulseOutcome {
    let Some(key) = slot.snapshot() else {
        return PulseOutcome::Idle;
    };
    if lines.row_is_high(RowLine::First) {
        return PulseOutcome::Stale;
    }

    let gpio = key.gpio;
    let completed = match key.row {
        0 => {
            lines.drive_column(gpio, false);
            let ok = spin_while(lines, spin_limit, |l| !l.row_is_high(RowLine::First));
            lines.drive_column(gpio, true);
            ok
        }
        1 => {
            if spin_while(lines, spin_limit, |l| l.row_is_high(RowLine::Second)) {
                lines.drive_column(gpio, false);
                let ok = spin_while(lines, spin_limit, |l| !l.row_is_high(RowLine::Second));
                lines.drive_column(gpio, true);
                ok
            } else {
                false
            }
        }
        2 => {
            if spin_while(lines, spin_limit, |l| !l.row_is_high(RowLine::Third)) {
                lines.drive_column(gpio, true);
                let ok = spin_while(lines, spin_limit, |l| l.row_is_high(RowLine::Third));
                lines.drive_column(gpio, false);
                ok
            } else {
                false
            }
        }
        3 => {
            let both_high = spin_while(lines, spin_limit, |l| {
                !l.row_is_high(RowLine::Third) || !l.row_is_high(RowLine::First)
            });
            if both_high {
                lines.drive_column(gpio, true);
                let ok = spin_while(lines, spin_limit, |l| l.row_is_high(RowLine::Third));
                lines.drive_column(gpio, false);
                ok
            } else {
                false
            }
        }
        _ => return PulseOutcome::Idle,
    };

    if completed {
        PulseOutcome::Pulsed
    } else {
        lines.drive_column(gpio, column_idle_high(key.row));
        PulseOutcome::TimedOut
    }
}
