use anyhow::Result;
use thoughtlocker_store::Locker;

use super::format;

pub fn run(locker: &Locker, enabled: Option<bool>) -> Result<()> {
    let specs = locker.list(enabled)?;

    if specs.is_empty() {
        println!("No prompts stored.");
    } else {
        format::print_spec_table(&specs);
    }

    Ok(())
}
