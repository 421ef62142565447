use crate::model::ScanResult;
use anyhow::Result;

pub fn print_json(result: &ScanResult) -> Result<()> {
    let json = super::format_result_to_string(result)?;
    println!("{}", json);
    Ok(())
}
