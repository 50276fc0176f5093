use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tokopt::Param;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub decls: String,
    pub params: usize,
    pub shorts: Vec<String>,
    pub longs: Vec<String>,
    pub positionals: Vec<String>,
    pub value_params: Vec<String>,
}

pub fn check_decls(path: &Path, params: &[Param<String>]) -> Result<CheckReport> {
    tokopt::param::check(params)
        .with_context(|| format!("invalid declarations: {}", path.display()))?;

    let mut shorts: Vec<String> = params
        .iter()
        .filter_map(|p| p.short_name())
        .map(|c| format!("-{c}"))
        .collect();
    let mut longs: Vec<String> = params
        .iter()
        .filter_map(|p| p.long_name())
        .map(|l| format!("--{l}"))
        .collect();
    shorts.sort();
    longs.sort();

    // Positionals keep declaration order: only the first one ever matches.
    let positionals = params
        .iter()
        .filter(|p| p.is_positional())
        .map(|p| p.id().clone())
        .collect();
    let value_params = params
        .iter()
        .filter(|p| p.expects_value() && !p.is_positional())
        .map(|p| p.id().clone())
        .collect();

    Ok(CheckReport {
        decls: path.display().to_string(),
        params: params.len(),
        shorts,
        longs,
        positionals,
        value_params,
    })
}
