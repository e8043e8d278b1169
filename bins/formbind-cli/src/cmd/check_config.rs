use crate::config::ConfigArgs;
use crate::error::CliError;

pub fn run(config: &ConfigArgs) -> Result<(), CliError> {
    let effective = config.load()?;
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}
