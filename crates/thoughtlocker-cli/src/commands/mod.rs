pub mod format;
pub mod get;
pub mod history;
pub mod list;
pub mod search;
pub mod seed;
