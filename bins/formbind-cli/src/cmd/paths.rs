use crate::config::PathsArgs;
use crate::error::CliError;

pub fn run(args: PathsArgs) -> Result<(), CliError> {
    let parsed = formbind::path::parse(&args.key)
        .map_err(|source| CliError::Path { key: args.key.clone(), source })?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
