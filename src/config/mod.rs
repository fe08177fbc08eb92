//! User configuration for compkit
//!
//! ## Architecture
//!
//! - `schema` - Configuration data structures
//! - `io` - Reading and writing the config file
//! - `paths` - Directory path management
//!
//! Every field is optional. Command-line flags and environment variables take
//! precedence over the file; the file takes precedence over built-in defaults.

pub mod io;
pub mod paths;
pub mod schema;

pub use io::{load_config, load_config_from, save_config_to};
pub use paths::{get_compkit_dir, get_config_path, get_log_dir};
pub use schema::CompkitConfig;
