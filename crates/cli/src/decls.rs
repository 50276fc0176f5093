use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokopt::Param;

pub const DEFAULT_DECLS_NAME: &str = "tokopt.json";
pub const DECLS_SCHEMA_VERSION: u32 = 1;

/// Declarations file (`tokopt.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclsFile {
    pub schema_version: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDef {
    /// Identifier printed for every match of this parameter.
    pub id: String,

    /// By-name form: `""` is positional, one character is a short name,
    /// anything longer is a long name. Exclusive with `short`/`long`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,

    #[serde(default)]
    pub takes_value: bool,
}

impl ParamDef {
    pub fn to_param(&self) -> Result<Param<String>> {
        let param = match &self.name {
            Some(_) if self.short.is_some() || self.long.is_some() => {
                bail!(
                    "param '{}': `name` cannot be combined with `short` or `long`",
                    self.id
                );
            }
            Some(name) => Param::named(self.id.clone(), name),
            None => {
                let short = self
                    .short
                    .as_deref()
                    .map(|s| single_char(s).with_context(|| format!("param '{}'", self.id)))
                    .transpose()?;
                Param::new(self.id.clone(), short, self.long.as_deref())
            }
        };
        Ok(param.takes_value(self.takes_value))
    }
}

impl DeclsFile {
    pub fn to_params(&self) -> Result<Vec<Param<String>>> {
        self.params.iter().map(ParamDef::to_param).collect()
    }
}

fn single_char(s: &str) -> Result<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => bail!("short name must be exactly one character, got {s:?}"),
    }
}

pub fn decls_path(base_dir: &Path) -> PathBuf {
    base_dir.join(DEFAULT_DECLS_NAME)
}

pub fn load_decls(path: &Path) -> Result<DeclsFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read declarations: {}", path.display()))?;
    let decls: DeclsFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse declarations JSON: {}", path.display()))?;
    if decls.schema_version != DECLS_SCHEMA_VERSION {
        bail!(
            "unsupported declarations schemaVersion {} (expected {})",
            decls.schema_version,
            DECLS_SCHEMA_VERSION
        );
    }
    tracing::debug!(
        path = %path.display(),
        params = decls.params.len(),
        "loaded declarations"
    );
    Ok(decls)
}

/// Example declarations covering every parameter form.
pub fn example_decls() -> DeclsFile {
    let def = |id: &str, name: &str, takes_value: bool| ParamDef {
        id: id.to_string(),
        name: Some(name.to_string()),
        takes_value,
        ..Default::default()
    };
    DeclsFile {
        schema_version: DECLS_SCHEMA_VERSION,
        params: vec![
            ParamDef {
                id: "verbose".to_string(),
                short: Some("v".to_string()),
                long: Some("verbose".to_string()),
                ..Default::default()
            },
            ParamDef {
                id: "output".to_string(),
                short: Some("o".to_string()),
                long: Some("output".to_string()),
                takes_value: true,
                ..Default::default()
            },
            def("all", "a", false),
            def("brief", "b", false),
            def("count", "c", true),
            def("file", "", false),
        ],
    }
}

pub fn write_decls(path: &Path, decls: &DeclsFile, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let bytes = serde_json::to_vec_pretty(decls).context("failed to serialize declarations")?;
    let mut out = String::from_utf8(bytes).context("declarations are not valid UTF-8")?;
    out.push('\n');

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, out.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move {} into place", path.display()))?;
    Ok(())
}
