//! Docket Common - Shared constants and helpers for the Docket workspace
//!
//! # Examples
//!
//! ```
//! use docket_common::{parse_bool, split_list, MAX_PAGE_LIMIT};
//!
//! assert_eq!(MAX_PAGE_LIMIT, 100);
//! assert_eq!(parse_bool("yes"), Some(true));
//! assert_eq!(split_list("title,comments"), vec!["title", "comments"]);
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
