use serde::Serialize;
use url::form_urlencoded;

use formbind::{Binder, ParameterSet};

use crate::config::{ConfigArgs, LayoutArgs};
use crate::error::CliError;

#[derive(Serialize)]
struct LayoutReport {
    prefix: String,
    len: usize,
    max_index: Option<usize>,
    indexed: Vec<usize>,
    append_start: usize,
    append_count: usize,
    rejected: Vec<String>,
}

pub fn run(config: &ConfigArgs, args: LayoutArgs) -> Result<(), CliError> {
    let config = config.load()?;
    let params: ParameterSet = form_urlencoded::parse(args.query.as_bytes())
        .into_owned()
        .collect();
    let binder = Binder::new(params).with_config(config.bind);

    let layout = binder.layout(&args.prefix);
    let report = LayoutReport {
        len: layout.len(),
        max_index: layout.max_index(),
        indexed: layout.indexed().collect(),
        append_start: layout.append_start(),
        append_count: layout.append_count(),
        rejected: layout.rejected().iter().map(ToString::to_string).collect(),
        prefix: args.prefix,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
