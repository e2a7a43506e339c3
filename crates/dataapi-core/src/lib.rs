#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod cursor;
pub mod filter;
pub mod results;
pub mod table;

mod error;
mod warning;

pub use cursor::{Cursor, CursorState, Page, PageFetcher};
pub use error::{DataApiError, DataApiErrors, Error, ErrorKind, Result, SharedError};
pub use filter::{Filter, FilterOperator, FilterSpec};
pub use warning::{Warning, Warnings};
