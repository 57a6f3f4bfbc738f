use anyhow::Result;
use thoughtlocker::SearchQuery;
use thoughtlocker_store::Locker;

use super::format;

pub fn run(locker: &Locker, query: &SearchQuery) -> Result<()> {
    let results = locker.search(query)?;

    if results.is_empty() {
        match query.text_filter() {
            Some(text) => println!("No results found for \"{text}\"."),
            None => println!("No results found."),
        }
    } else {
        format::print_spec_table(&results);
    }

    Ok(())
}
