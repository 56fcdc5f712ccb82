//! Human-readable control-store dump.
//!
//! One line per address: `0xAAA: 0xNNN JJJ SS FFFFFF EEEEEEEEE MMM BBBB`,
//! where `0xAAA` is the address, `0xNNN` the next-address field, and the
//! remaining groups are the raw bits of jam(3), shifter(2), ALU control(6),
//! bus-C enables(9), memory/fetch(3), and bus-B select(4).

use std::fmt::Write;

use super::control::{self, CONTROL_STORE_WORDS, WORD_BITS};
use crate::common::Result;

/// Field groups rendered as raw binary digits, as `(from, to)` bit ranges.
const BIT_GROUPS: [(usize, usize); 6] = [(9, 12), (12, 14), (14, 20), (20, 29), (29, 32), (32, 36)];

/// Renders a packed control-store image as 512 dump lines.
///
/// # Errors
///
/// Returns [`crate::Error::ControlStoreSize`] when the image is not exactly
/// 2304 bytes.
pub fn render(image: &[u8]) -> Result<String> {
    let mut out = String::with_capacity(CONTROL_STORE_WORDS * 48);

    for address in 0..CONTROL_STORE_WORDS {
        let word = control::word_at(image, address)?;
        let next = word >> (WORD_BITS - 9);

        let _ = write!(out, "0x{address:03X}: 0x{next:03X}");
        for (from, to) in BIT_GROUPS {
            out.push(' ');
            for position in from..to {
                let set = (word >> (WORD_BITS - 1 - position)) & 1 == 1;
                out.push(if set { '1' } else { '0' });
            }
        }
        out.push('\n');
    }

    Ok(out)
}
