use crate::output::print_json;
use anyhow::Context;
use std::path::Path;
use tally_core::{render::render, store};

pub fn run(data_file: &Path, json: bool) -> anyhow::Result<()> {
    let doc = store::read_only(data_file)
        .with_context(|| format!("failed to read {}", data_file.display()))?;

    if json {
        print_json(&doc.to_value()?)?;
    } else {
        println!("{}", render(&doc));
    }
    Ok(())
}
