//! Domain-list input and report output.

use std::fs;
use std::path::Path;

use crate::analyzer::{DomainVerdict, RunSummary};
use crate::error::{Error, Result};

/// Parse the domain list: one domain per line, blank lines skipped,
/// one trailing dot stripped.
pub fn parse_domains(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            Some(line.strip_suffix('.').unwrap_or(line).to_string())
        })
        .collect()
}

/// Read and parse the domain list from `path`.
pub fn read_domains(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| Error::Input {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_domains(&text))
}

/// Render the semicolon-delimited verdict table.
pub fn render_table(verdicts: &[DomainVerdict]) -> String {
    let mut table = String::from("Domain;ECS support;Same across different subnets\n");
    for v in verdicts {
        table.push_str(&format!(
            "{};{};{}\n",
            v.domain, v.ecs_supported, v.consistent_across_subnets
        ));
    }
    table
}

/// Write the verdict table to `path`.
pub fn write_report(path: &Path, verdicts: &[DomainVerdict]) -> Result<()> {
    fs::write(path, render_table(verdicts)).map_err(|source| Error::Output {
        path: path.to_path_buf(),
        source,
    })
}

/// Print the end-of-run console summary.
pub fn print_summary(output: &Path, summary: &RunSummary) {
    println!("Output has been written to {}.", output.display());
    println!("Overall domains analyzed: {}", summary.total_domains);
    println!("Domains that support ECS: {}", summary.ecs_supported);
    println!(
        "Domains that support ECS, but results are the same across subnets: {}",
        summary.ecs_but_consistent
    );
}
