use anyhow::Result;
use thoughtlocker_store::Locker;

pub fn run(locker: &Locker, name: &str, json: bool) -> Result<()> {
    let spec = locker.get(name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&spec)?);
    } else {
        println!("{}", spec.system_instruction);
    }

    Ok(())
}
