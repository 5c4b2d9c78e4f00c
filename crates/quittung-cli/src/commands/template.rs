use quittung_core::error::QuittungError;
use quittung_core::template::{builtin_full_page, derive_template, load_template};
use std::path::PathBuf;

pub fn run(offset: u32, baseline: Option<PathBuf>) -> Result<(), QuittungError> {
    let baseline = match baseline {
        Some(path) => load_template(&path)?,
        None => builtin_full_page()?,
    };

    let derived = derive_template(&baseline, offset);
    println!("{}", derived.to_json()?);
    Ok(())
}
