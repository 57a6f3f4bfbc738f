use anyhow::{Result, bail};
use thoughtlocker_store::Locker;

use super::format;

pub fn run(locker: &Locker, name: &str) -> Result<()> {
    let versions = locker.history(name)?;

    if versions.is_empty() {
        bail!("No history for '{name}'");
    }

    for version in &versions {
        println!("{}", format::version_line(version));
    }

    Ok(())
}
