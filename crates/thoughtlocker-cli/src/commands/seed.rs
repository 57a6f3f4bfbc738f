use std::path::Path;

use anyhow::{Context, Result};
use thoughtlocker_store::Locker;

pub fn run(locker: &Locker, yaml: &Path) -> Result<()> {
    let report = locker
        .seed_from_yaml(yaml)
        .with_context(|| format!("failed to seed from {}", yaml.display()))?;

    println!(
        "Seeding complete. created={} updated={} unchanged={}",
        report.created, report.updated, report.unchanged
    );

    Ok(())
}
