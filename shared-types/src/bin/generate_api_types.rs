use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Lead types
    types.push(clean_type(Lead::export_to_string()?));
    types.push(clean_type(LeadStatus::export_to_string()?));
    types.push(clean_type(LeadSource::export_to_string()?));
    types.push(clean_type(LeadPayload::export_to_string()?));
    types.push(clean_type(LeadsPage::export_to_string()?));

    // Listing state types
    types.push(clean_type(FilterState::export_to_string()?));
    types.push(clean_type(Pagination::export_to_string()?));

    // Auth types
    types.push(clean_type(Credentials::export_to_string()?));
    types.push(clean_type(UserProfile::export_to_string()?));
    types.push(clean_type(ErrorResponse::export_to_string()?));

    let output_dir = Path::new("../gui/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// Strips the generated-file banner and the per-file imports, since every
/// type ends up in the same `types.ts`.
fn clean_type(type_def: String) -> String {
    let body = type_def
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!("{}\n", body)
    }
}
