//! Wrappers over the response shapes returned by Data API commands.
//!
//! Each wrapper carries the raw body, the warnings reported with it and the
//! error produced while classifying the response. Decoding surfaces the error
//! first, so callers only have to check one place.

mod count;
mod insert;
mod multiple;
mod single;

pub use self::count::CountResult;
pub use self::insert::{ColumnTypeInfo, InsertResponse, InsertStatus};
pub use self::multiple::MultipleResult;
pub use self::single::SingleResult;
