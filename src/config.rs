//! Configuration Management
//!
//! Label model, label definition files, sync policy and repository selection

use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Label
///
/// A repository label as a name/color/description value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    /// Label name (unique within a repository, case-sensitive)
    pub name: String,

    /// Label color (6-digit hex code, normalized without #)
    pub color: String,

    /// Label description (empty when unset)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl Label {
    /// Create a new label with an empty description
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: String::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Normalized color of this label
    pub fn normalized_color(&self) -> String {
        normalize_color(&self.color)
    }

    /// Validate label definition
    ///
    /// # Errors
    /// - If the name is empty
    /// - If the color is not 6 hex digits after normalization
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::label_validation("Label name cannot be empty"));
        }

        if !is_valid_hex_color(&self.normalized_color()) {
            return Err(Error::InvalidLabelColor(format!(
                "{} (label '{}')",
                self.color, self.name
            )));
        }

        Ok(())
    }
}

/// GitHub returns `"description": null` for labels without one
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Normalize color (remove leading # and convert to lowercase)
pub fn normalize_color(color: &str) -> String {
    color
        .strip_prefix('#')
        .unwrap_or(color)
        .to_ascii_lowercase()
}

/// Label definition file
///
/// A single top-level `labels` field holding the ordered label list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelFile {
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Yaml,
    Json,
    /// Aligned terminal table (display only, not readable back)
    Table,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            "json" => Ok(ExportFormat::Json),
            "table" => Ok(ExportFormat::Table),
            other => Err(Error::config_validation(format!(
                "Unsupported format: {other} (use yaml, json or table)"
            ))),
        }
    }
}

/// Sync Policy
///
/// Immutable switches that decide which planned changes the reconciler applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Update existing labels whose color or description differ
    pub force_update: bool,

    /// Delete labels that are not in the desired set
    pub delete_unmanaged: bool,

    /// Report what would change without applying it
    pub dry_run: bool,

    /// Confirmation already granted (skip the prompt)
    pub assume_yes: bool,
}

/// Repository identifier (owner + name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (owner, name) = parse_repository(s)?;
        Ok(Self { owner, name })
    }
}

/// Parse repository string into owner and name
///
/// # Arguments
/// - `repo`: Repository string in "owner/repo" format
///
/// # Errors
/// Returns an error if the format is invalid
pub fn parse_repository(repo: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = repo.split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(Error::InvalidRepositoryFormat(repo.to_string()));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Extract owner/repo from a git remote URL
///
/// Understands `https://host/owner/repo(.git)`, `ssh://git@host/owner/repo.git`
/// and scp-like `git@host:owner/repo.git` forms.
pub fn parse_remote_url(remote: &str) -> Option<Repository> {
    let remote = remote.trim();

    let path = match url::Url::parse(remote) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => {
            // scp-like syntax: [user@]host:path
            let (host, path) = remote.split_once(':')?;
            if host.is_empty() || host.contains('/') {
                return None;
            }
            path.to_string()
        }
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    path.parse().ok()
}

/// Resolve the target repository
///
/// Uses the explicit selector if given, then `GH_REPO`, then the `origin`
/// remote of the git checkout in the current directory.
///
/// # Errors
/// If the selector is malformed or no repository can be determined
pub async fn resolve_repository(selector: Option<&str>) -> Result<Repository> {
    if let Some(repo) = selector {
        return repo.parse();
    }

    if let Ok(repo) = std::env::var("GH_REPO") {
        if !repo.trim().is_empty() {
            return repo.trim().parse();
        }
    }

    let output = tokio::process::Command::new("git")
        .args(["remote", "get-url", "origin"])
        .output()
        .await
        .map_err(|e| Error::RepositoryNotDetected(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::RepositoryNotDetected(stderr.trim().to_string()));
    }

    let remote = String::from_utf8_lossy(&output.stdout);
    tracing::debug!(remote = %remote.trim(), "Detected git remote");

    parse_remote_url(&remote).ok_or_else(|| {
        Error::RepositoryNotDetected(format!("unrecognized remote URL: {}", remote.trim()))
    })
}

/// Load label definitions from a file
///
/// `-` reads from stdin. The extension selects the format: `.yml`/`.yaml`,
/// `.json` or `.csv`; anything else is tried as YAML. Colors are normalized
/// and every label is validated.
///
/// # Errors
/// If the file cannot be read or parsed, a label is invalid, or no labels are defined
pub fn load_labels_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Label>> {
    let path = path.as_ref();

    let labels = if path == Path::new("-") {
        load_labels_from_reader(std::io::stdin())?
    } else {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Label file not found: {}", path.display()),
            )
            .into());
        }

        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("yml") | Some("yaml") => parse_labels_yaml(&content)?,
            Some("json") => parse_labels_json(&content)?,
            Some("csv") => parse_labels_csv(content.as_bytes())?,
            _ => parse_labels_yaml(&content).map_err(|e| {
                Error::config_validation(format!(
                    "Unsupported file format (use .yml, .json, or .csv): {e}"
                ))
            })?,
        }
    };

    finalize_labels(labels)
}

/// Load label definitions from any reader, auto-detecting JSON or YAML format
///
/// # Errors
/// If the reader is empty, or parsing fails
pub fn load_labels_from_reader<R: Read>(mut reader: R) -> Result<Vec<Label>> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;

    if content.trim().is_empty() {
        return Err(Error::config_validation("Empty input from stdin"));
    }

    // Try JSON first
    if let Ok(labels) = parse_labels_json(&content) {
        return Ok(labels);
    }

    parse_labels_yaml(&content)
}

/// Parse a YAML label file
pub fn parse_labels_yaml(content: &str) -> Result<Vec<Label>> {
    let file: LabelFile = serde_yaml::from_str(content)?;
    Ok(file.labels)
}

/// Parse a JSON label file
pub fn parse_labels_json(content: &str) -> Result<Vec<Label>> {
    let file: LabelFile = serde_json::from_str(content)?;
    Ok(file.labels)
}

/// Parse delimited text with a header row
///
/// Requires `name` and `color` columns; `description` (or `desc`) is optional.
/// Column names are matched case-insensitively after trimming whitespace.
///
/// # Errors
/// If the header is missing required columns or a row is malformed
pub fn parse_labels_csv<R: Read>(reader: R) -> Result<Vec<Label>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut name_idx = None;
    let mut color_idx = None;
    let mut desc_idx = None;
    for (i, column) in reader.headers()?.iter().enumerate() {
        match column.trim().to_ascii_lowercase().as_str() {
            "name" => name_idx = Some(i),
            "color" => color_idx = Some(i),
            "description" | "desc" => desc_idx = Some(i),
            _ => {}
        }
    }

    let (Some(name_idx), Some(color_idx)) = (name_idx, color_idx) else {
        return Err(Error::config_validation(
            "CSV must have 'name' and 'color' columns",
        ));
    };

    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize, column: &str| {
            record.get(idx).map(str::to_string).ok_or_else(|| {
                // header is line 1
                Error::config_validation(format!(
                    "CSV row {} is missing the '{column}' column",
                    row + 2
                ))
            })
        };

        labels.push(Label {
            name: field(name_idx, "name")?,
            color: field(color_idx, "color")?,
            description: desc_idx
                .and_then(|idx| record.get(idx))
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(labels)
}

/// Normalize colors, validate, and reject an empty set
fn finalize_labels(mut labels: Vec<Label>) -> Result<Vec<Label>> {
    if labels.is_empty() {
        return Err(Error::config_validation("No labels found in file"));
    }

    for label in &mut labels {
        label.color = normalize_color(&label.color);
        label.validate()?;
    }

    Ok(labels)
}

/// Write labels as a label file in the given format
///
/// # Errors
/// If serialization or writing fails
pub fn write_labels<W: Write>(mut writer: W, labels: &[Label], format: ExportFormat) -> Result<()> {
    let file = LabelFile {
        labels: labels.to_vec(),
    };

    match format {
        ExportFormat::Yaml => serde_yaml::to_writer(&mut writer, &file)?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &file)?;
            writeln!(writer)?;
        }
        ExportFormat::Table => write!(writer, "{}", crate::render::format_label_table(labels))?,
    }

    Ok(())
}

/// Validate hex color code
///
/// # Arguments
/// - `color`: Color code (6-digit hex without #)
fn is_valid_hex_color(color: &str) -> bool {
    color.len() == 6 && color.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hex_color() {
        assert!(is_valid_hex_color("ff0000"));
        assert!(is_valid_hex_color("00FF00"));
        assert!(is_valid_hex_color("123abc"));

        assert!(!is_valid_hex_color("ff00")); // Too short
        assert!(!is_valid_hex_color("ff0000x")); // Invalid character
        assert!(!is_valid_hex_color("#ff0000")); // With #
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#FF0000"), "ff0000");
        assert_eq!(normalize_color("ff0000"), "ff0000");
        assert_eq!(normalize_color("D73A4A"), "d73a4a");
        // only one leading # is stripped
        assert_eq!(normalize_color("##abcdef"), "#abcdef");
    }

    #[test]
    fn test_parse_repository() {
        assert!(parse_repository("owner/repo").is_ok());
        assert!(parse_repository("org/project").is_ok());

        assert!(parse_repository("repo").is_err()); // No slash
        assert!(parse_repository("/repo").is_err()); // No owner
        assert!(parse_repository("owner/").is_err()); // No repo name
        assert!(parse_repository("owner/repo/sub").is_err()); // Too many parts
    }

    #[test]
    fn test_repository_display_roundtrip() {
        let repo: Repository = "octo/labels".parse().unwrap();
        assert_eq!(repo, Repository::new("octo", "labels"));
        assert_eq!(repo.to_string(), "octo/labels");
    }

    #[test]
    fn test_parse_remote_url() {
        let expected = Some(Repository::new("owner", "repo"));
        assert_eq!(parse_remote_url("https://github.com/owner/repo"), expected);
        assert_eq!(parse_remote_url("https://github.com/owner/repo.git\n"), expected);
        assert_eq!(parse_remote_url("git@github.com:owner/repo.git"), expected);
        assert_eq!(parse_remote_url("ssh://git@github.com/owner/repo.git"), expected);

        assert_eq!(parse_remote_url("not a remote"), None);
        assert_eq!(parse_remote_url("https://github.com/owner"), None);
    }

    #[tokio::test]
    async fn test_resolve_repository_prefers_selector() {
        let repo = resolve_repository(Some("owner/repo")).await.unwrap();
        assert_eq!(repo, Repository::new("owner", "repo"));

        assert!(resolve_repository(Some("invalid")).await.is_err());
    }

    #[test]
    fn test_label_validation() {
        assert!(Label::new("bug", "ff0000").validate().is_ok());
        assert!(Label::new("bug", "#ff0000").validate().is_ok());
        assert!(Label::new("bug", "#FF0000").validate().is_ok());

        assert!(Label::new("", "ff0000").validate().is_err());
        assert!(Label::new("  ", "ff0000").validate().is_err());
        assert!(Label::new("bug", "invalid").validate().is_err());
        assert!(Label::new("bug", "#ff00").validate().is_err());
    }

    #[test]
    fn test_null_description_reads_as_empty() {
        let label: Label =
            serde_json::from_str(r#"{"name":"bug","color":"d73a4a","description":null}"#)
                .unwrap();
        assert_eq!(label.description, "");

        let label: Label = serde_json::from_str(r#"{"name":"bug","color":"d73a4a"}"#).unwrap();
        assert_eq!(label.description, "");
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("yaml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert_eq!("yml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("table".parse::<ExportFormat>().unwrap(), ExportFormat::Table);
        assert!("toml".parse::<ExportFormat>().is_err());
    }

    // --- load_labels_from_file tests ---

    #[test]
    fn test_load_labels_from_file_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.yml");
        std::fs::write(
            &path,
            "labels:\n  - name: bug\n    color: \"#D73A4A\"\n    description: Something isn't working\n  - name: docs\n    color: 0075ca\n",
        )
        .unwrap();
        let labels = load_labels_from_file(&path).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name, "bug");
        assert_eq!(labels[0].color, "d73a4a");
        assert_eq!(labels[0].description, "Something isn't working");
        assert_eq!(labels[1].description, "");
    }

    #[test]
    fn test_load_labels_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(
            &path,
            r##"{"labels":[{"name":"bug","color":"#ff0000","description":"A bug"}]}"##,
        )
        .unwrap();
        let labels = load_labels_from_file(&path).unwrap();
        assert_eq!(labels, vec![Label::new("bug", "ff0000").with_description("A bug")]);
    }

    #[test]
    fn test_load_labels_from_file_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        std::fs::write(
            &path,
            " Name ,COLOR, Desc\nbug,#d73a4a,\"Broken, badly\"\ndocs,0075ca,\n",
        )
        .unwrap();
        let labels = load_labels_from_file(&path).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name, "bug");
        assert_eq!(labels[0].color, "d73a4a");
        assert_eq!(labels[0].description, "Broken, badly");
        assert_eq!(labels[1].description, "");
    }

    #[test]
    fn test_load_labels_from_file_unknown_extension_falls_back_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "labels:\n  - name: bug\n    color: ff0000\n").unwrap();
        let labels = load_labels_from_file(&path).unwrap();
        assert_eq!(labels.len(), 1);

        let path = dir.path().join("broken.txt");
        std::fs::write(&path, "labels: [unterminated").unwrap();
        let err = load_labels_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_load_labels_from_file_not_found() {
        assert!(load_labels_from_file("/nonexistent/labels.yml").is_err());
    }

    #[test]
    fn test_load_labels_from_file_empty_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.yml");
        std::fs::write(&path, "labels: []\n").unwrap();
        let err = load_labels_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("No labels found"));
    }

    #[test]
    fn test_load_labels_from_file_invalid_color() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"labels":[{"name":"bug","color":"red"}]}"#).unwrap();
        assert!(load_labels_from_file(&path).is_err());
    }

    // --- csv tests ---

    #[test]
    fn test_csv_missing_required_column() {
        let result = parse_labels_csv("name,description\nbug,A bug\n".as_bytes());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("'name' and 'color'"));
    }

    #[test]
    fn test_csv_short_row() {
        let result = parse_labels_csv("name,color\nbug\n".as_bytes());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_csv_column_order_is_free() {
        let labels = parse_labels_csv("description,color,name\nA bug,ff0000,bug\n".as_bytes())
            .unwrap();
        assert_eq!(labels, vec![Label::new("bug", "ff0000").with_description("A bug")]);
    }

    // --- load_labels_from_reader tests ---

    #[test]
    fn test_load_labels_from_reader_json() {
        let input = r##"{"labels":[{"name":"bug","color":"#ff0000"}]}"##.as_bytes();
        let labels = load_labels_from_reader(input).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "bug");
    }

    #[test]
    fn test_load_labels_from_reader_yaml() {
        let input = "labels:\n  - name: bug\n    color: \"#ff0000\"\n".as_bytes();
        let labels = load_labels_from_reader(input).unwrap();
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn test_load_labels_from_reader_empty() {
        let err = load_labels_from_reader("   \n  \t  ".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Empty input"));
    }

    // --- write_labels tests ---

    #[test]
    fn test_write_labels_yaml_reads_back() {
        let labels = vec![
            Label::new("bug", "d73a4a").with_description("Something isn't working"),
            Label::new("docs", "0075ca"),
        ];
        let mut out = Vec::new();
        write_labels(&mut out, &labels, ExportFormat::Yaml).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("labels:"));
        assert_eq!(parse_labels_yaml(&text).unwrap(), labels);
    }

    #[test]
    fn test_write_labels_json_shape() {
        let labels = vec![Label::new("bug", "d73a4a")];
        let mut out = Vec::new();
        write_labels(&mut out, &labels, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["labels"][0]["name"], "bug");
        assert_eq!(value["labels"][0]["color"], "d73a4a");
        assert_eq!(value["labels"][0]["description"], "");
    }
}
