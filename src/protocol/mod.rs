//! Protocol Module
//!
//! Defines the row format curve data is exchanged in.
//!
//! ## Batch Format
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ mnemonic list   "DEPTH,GR,ROP"               │  once per batch
//! │ unit list       "m,gAPI,m/h"                 │  once per batch
//! ├──────────────────────────────────────────────┤
//! │ row             "100.0,45.1,12"              │
//! │ row             "100.5,,12.4"                │  GR missing at 100.5
//! │ ...                                          │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The index value is always the first column.

mod codec;
mod row;

pub use codec::{
    decode_batch, decode_row, encode_batch, encode_row, encode_rows, join_list, read_data_file,
    split_list, write_data_file, DELIMITER,
};
pub use row::{CurveBatch, CurveRow, CurveRowSet};
