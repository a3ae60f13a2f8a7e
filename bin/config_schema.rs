use darca_log_facility::Settings;
use schemars::schema_for;

fn main() -> anyhow::Result<()> {
    let schema = schema_for!(Settings);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
