pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, ellipsize, safe_truncate_chars, word_count};
pub use url_utils::{compile_glob_pattern, display_domain, get_output_path, is_valid_url};
