pub mod checksum;
pub mod history;
pub mod loader;
pub mod query;
pub mod spec;

pub use checksum::{REQUIRED_FIELDS, compute_checksum};
pub use history::{UpsertOutcome, VersionAction, VersionRow};
pub use loader::{LoadError, parse_specs, read_specs};
pub use query::{DEFAULT_SEARCH_LIMIT, SearchQuery};
pub use spec::{PromptSpec, SpecRow, decode_json_column, format_timestamp, parse_timestamp};
