//! Info command - describe the scanner and its parameters.

use anyhow::Result;
use keyscan_core::ScannerInfo;

pub fn run(json: bool) -> Result<()> {
    let info = ScannerInfo::new();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Scanner:        {}", info.name);
    println!("Tool version:   {}", info.version_display());
    println!("Server version: {}", info.server_version);
    println!();
    println!("{}", info.description);
    println!();

    println!(
        "{:<14} {:<26} {:<9} {:<8} {:<9} DESCRIPTION",
        "ID", "NAME", "TYPE", "DEFAULT", "MANDATORY"
    );
    println!("{}", "-".repeat(90));

    for param in &info.params {
        let param_type = format!("{:?}", param.param_type).to_lowercase();
        println!(
            "{:<14} {:<26} {:<9} {:<8} {:<9} {}",
            param.id,
            param.name,
            param_type,
            param.default.to_string(),
            if param.mandatory { "yes" } else { "no" },
            param.description
        );
    }

    Ok(())
}
