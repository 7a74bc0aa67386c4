//! The 4x4 matrix keypad, scanned row by row with edge-triggered columns.
//!
//! [RowScanner] drives one row at a time from a periodic timer, a column edge handler feeds
//! [KeySource::on_column_edge], and the polling loop drains accepted keys from the same
//! [KeySource]. The source is the only state shared between those contexts and is entirely atomic.

mod key;
mod scan;
mod source;

pub use key::*;
pub use scan::*;
pub use source::*;
