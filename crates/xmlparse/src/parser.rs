//! `XmlParser`: the entry point tying the pipeline together
//!
//! In raw mode a document is returned in its raw dictionary shape. In custom
//! mode it is flattened and, when a configuration with a table tree is set,
//! projected into the configured tables.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use tracing::{debug, info, instrument};

use crate::config::{CompiledConfig, Identifiers};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Error, Result};
use crate::value::{Object, Value};
use crate::xml::{self, WriteOptions};
use crate::{flatten, project, raw, serialize};

/// Indent unit for pretty raw output
pub const RAW_INDENT: &str = "\t";
/// Header written in front of custom output by default
pub const DEFAULT_HEADER: &str = "<?xml version='1.0' encoding='utf-8'?>";
/// Root element name of custom output by default
pub const DEFAULT_ROOT: &str = "root";

/// How documents are turned into dictionaries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParserMode {
    /// Plain XML to dictionary conversion
    #[default]
    Raw,
    /// Flattening and configuration driven projection
    Custom,
}

impl FromStr for ParserMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Self::Raw),
            "custom" => Ok(Self::Custom),
            other => Err(Error::invalid_mode(other)),
        }
    }
}

impl fmt::Display for ParserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Where the configuration comes from
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigSource {
    /// JSON file, read when the configuration is compiled
    File(PathBuf),
    /// Configuration mapping held in memory
    Inline(Value),
}

/// Shape of the dictionary handed to [`XmlParser::dump`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DumpFormat {
    /// Raw dictionary shape, a single root key
    #[default]
    Raw,
    /// Any dictionary, typically a custom parse result
    Custom,
}

impl FromStr for DumpFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Self::Raw),
            "custom" => Ok(Self::Custom),
            other => Err(Error::invalid_mode(other)),
        }
    }
}

/// Options for writing XML back out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpOptions {
    pub format: DumpFormat,
    pub pretty: bool,
    /// Wrap row data in CDATA sections (raw format only)
    pub cdata: bool,
    /// Root element name (custom format only)
    pub root: String,
    /// Text written verbatim before the root (custom format only)
    pub header: String,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            format: DumpFormat::Raw,
            pretty: true,
            cdata: true,
            root: DEFAULT_ROOT.to_string(),
            header: DEFAULT_HEADER.to_string(),
        }
    }
}

impl DumpOptions {
    pub fn custom() -> Self {
        Self {
            format: DumpFormat::Custom,
            ..Self::default()
        }
    }
}

/// A parse result together with everything that went wrong on the way
#[derive(Clone, Debug, PartialEq)]
pub struct ParseReport {
    pub data: Value,
    pub diagnostics: Diagnostics,
}

/// Converts XML documents into dictionaries and back
#[derive(Clone, Debug, Default)]
pub struct XmlParser {
    mode: ParserMode,
    ids: Identifiers,
    config_source: Option<ConfigSource>,
    compiled: Option<CompiledConfig>,
}

impl XmlParser {
    pub fn new(mode: ParserMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Create a parser from a mode name, `raw` or `custom`
    pub fn from_mode_name(mode: &str) -> Result<Self> {
        Ok(Self::new(mode.parse()?))
    }

    pub fn with_config(mut self, source: ConfigSource) -> Self {
        self.set_config(Some(source));
        self
    }

    pub fn with_config_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_config(ConfigSource::File(path.into()))
    }

    pub fn with_identifiers(mut self, ids: Identifiers) -> Self {
        self.ids = ids;
        self.compiled = None;
        self
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ParserMode) {
        self.mode = mode;
    }

    /// Switch mode by name, leaving the current mode in place on error
    pub fn set_mode_name(&mut self, mode: &str) -> Result<()> {
        self.mode = mode.parse()?;
        Ok(())
    }

    pub fn identifiers(&self) -> &Identifiers {
        &self.ids
    }

    pub fn config_source(&self) -> Option<&ConfigSource> {
        self.config_source.as_ref()
    }

    /// Replace the configuration, compiled again on next use
    pub fn set_config(&mut self, source: Option<ConfigSource>) {
        self.config_source = source;
        self.compiled = None;
    }

    /// Compile the configuration now, replacing any cached one
    ///
    /// Unlike a parse, which falls back to unformatted output, this reports
    /// an unreadable or malformed configuration as an error.
    pub fn reload_config(&mut self) -> Result<&CompiledConfig> {
        let compiled = self.compile_config()?;
        Ok(self.compiled.insert(compiled))
    }

    fn compile_config(&self) -> Result<CompiledConfig> {
        match &self.config_source {
            None => Ok(CompiledConfig::default()),
            Some(ConfigSource::Inline(config)) => CompiledConfig::compile(config, &self.ids),
            Some(ConfigSource::File(path)) => {
                debug!("loading configuration {}", path.display());
                let text = fs::read_to_string(path)?;
                CompiledConfig::from_json_str(&text, &self.ids)
            }
        }
    }

    fn prepare_config(&mut self, diags: &mut Diagnostics) {
        if self.compiled.is_some() {
            return;
        }
        match self.compile_config() {
            Ok(compiled) => self.compiled = Some(compiled),
            Err(err) => diags.push(Diagnostic::BadConfiguration {
                reason: err.to_string(),
            }),
        }
    }

    /// Parse an XML file
    pub fn parse(&mut self, path: impl AsRef<Path>) -> Value {
        self.parse_with_report(path).data
    }

    /// Parse XML text
    pub fn parse_str(&mut self, xml: &str) -> Value {
        self.parse_str_with_report(xml).data
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn parse_with_report(&mut self, path: impl AsRef<Path>) -> ParseReport {
        let path = path.as_ref();
        let mut diagnostics = Diagnostics::new();
        let data = match fs::read_to_string(path) {
            Ok(text) => self.run(&text, &path.display().to_string(), &mut diagnostics),
            Err(err) => {
                diagnostics.push(Diagnostic::CorruptInput {
                    source: path.display().to_string(),
                    reason: err.to_string(),
                });
                Value::empty_object()
            }
        };
        ParseReport { data, diagnostics }
    }

    pub fn parse_str_with_report(&mut self, xml: &str) -> ParseReport {
        let mut diagnostics = Diagnostics::new();
        let data = self.run(xml, "<string>", &mut diagnostics);
        ParseReport { data, diagnostics }
    }

    fn run(&mut self, xml: &str, source: &str, diags: &mut Diagnostics) -> Value {
        let started = Instant::now();
        let doc = match xml::parse_str(xml) {
            Ok(doc) => doc,
            Err(err) => {
                diags.push(Diagnostic::CorruptInput {
                    source: source.to_string(),
                    reason: err.to_string(),
                });
                return Value::empty_object();
            }
        };

        let raw = raw::document_to_value(&doc);
        let data = match self.mode {
            ParserMode::Raw => {
                info!("raw xml to dict parsing");
                raw
            }
            ParserMode::Custom => self.format(&raw, diags),
        };

        info!(
            "parsed {source} in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        data
    }

    fn format(&mut self, raw: &Value, diags: &mut Diagnostics) -> Value {
        self.prepare_config(diags);
        let flattened = flatten::flatten(raw, &self.ids, diags);

        let config = match &self.compiled {
            Some(config) if !config.is_empty() => config,
            _ => {
                info!("unformatted custom parsing");
                return Value::Object(flattened);
            }
        };

        let projected = match root_content(&flattened) {
            Some(payload) => project::project(config, payload, diags),
            None => {
                diags.push(Diagnostic::BadConfiguration {
                    reason: "document root has nothing to project".to_string(),
                });
                return Value::Object(flattened);
            }
        };

        info!("formatted custom parsing");
        for (table, value) in &projected {
            if !value.is_truthy() {
                diags.push(Diagnostic::EmptyTable {
                    table: table.clone(),
                });
            }
        }
        Value::Object(projected)
    }

    /// Write `data` as XML to `path`
    pub fn dump(&self, data: &Value, path: impl AsRef<Path>, options: &DumpOptions) -> Result<()> {
        let output = self.dumps(data, options)?;
        fs::write(path.as_ref(), output)?;
        debug!("wrote {}", path.as_ref().display());
        Ok(())
    }

    /// Render `data` as XML text
    pub fn dumps(&self, data: &Value, options: &DumpOptions) -> Result<String> {
        match options.format {
            DumpFormat::Raw => {
                let cdata = options.cdata.then_some(self.ids.data_key.as_str());
                let doc = raw::value_to_document(data, cdata)?;
                let layout = if options.pretty {
                    WriteOptions::indented(RAW_INDENT)
                } else {
                    WriteOptions::compact()
                };
                Ok(xml::write_document(&doc, &layout))
            }
            DumpFormat::Custom => {
                serialize::serialize(data, &options.root, &options.header, options.pretty)
            }
        }
    }
}

fn root_content(flattened: &Object) -> Option<&Object> {
    flattened.values().next().and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const DOC: &str = r#"<root>
        <table name="info"><header><th>k</th></header><rows>v</rows></table>
    </root>"#;

    fn config(text: &str) -> ConfigSource {
        ConfigSource::Inline(serde_json::from_str(text).unwrap_or_default())
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("raw".parse::<ParserMode>().ok(), Some(ParserMode::Raw));
        assert_eq!("custom".parse::<ParserMode>().ok(), Some(ParserMode::Custom));
        let err = XmlParser::from_mode_name("fancy").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::InvalidMode {
                given: "fancy".to_string()
            })
        );

        let mut parser = XmlParser::new(ParserMode::Custom);
        assert!(parser.set_mode_name("json").is_err());
        assert_eq!(parser.mode(), ParserMode::Custom);
    }

    #[test]
    fn test_raw_mode_returns_raw_shape() {
        let mut parser = XmlParser::default();
        let data = parser.parse_str("<a x=\"1\"><b>t</b></a>");
        let expected: Value =
            serde_json::from_str(r#"{"a": {"@x": "1", "b": "t"}}"#).unwrap_or_default();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_custom_without_config_is_flattened() {
        let mut parser = XmlParser::new(ParserMode::Custom);
        let report = parser.parse_str_with_report(DOC);
        let expected: Value =
            serde_json::from_str(r#"{"root": {"table": {"info": {"k": ["v"]}}}}"#)
                .unwrap_or_default();
        assert_eq!(report.data, expected);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_custom_with_config_projects_and_reports_empty_tables() {
        let mut parser = XmlParser::new(ParserMode::Custom).with_config(config(
            r#"{"TREE": {"INFO": {}, "NONE": {}}, "INFO": "table,info", "NONE": []}"#,
        ));
        let report = parser.parse_str_with_report(DOC);
        let expected: Value =
            serde_json::from_str(r#"{"INFO": {"k": ["v"]}, "NONE": {}}"#).unwrap_or_default();
        assert_eq!(report.data, expected);
        assert_eq!(
            report.diagnostics.into_vec(),
            vec![Diagnostic::EmptyTable {
                table: "NONE".to_string()
            }]
        );
    }

    #[test]
    fn test_corrupt_input_gives_empty_result() {
        let mut parser = XmlParser::new(ParserMode::Custom);
        let report = parser.parse_str_with_report("<root><open></root>");
        assert_eq!(report.data, Value::empty_object());
        assert!(matches!(
            report.diagnostics.iter().next(),
            Some(Diagnostic::CorruptInput { .. })
        ));

        let report = parser.parse_with_report("/definitely/not/here.xml");
        assert_eq!(report.data, Value::empty_object());
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn test_bad_configuration_falls_back_to_flattened() {
        let mut parser = XmlParser::new(ParserMode::Custom).with_config(config(r#"{"TREE": 5}"#));
        let report = parser.parse_str_with_report(DOC);
        assert!(report.data.as_object().is_some_and(|o| o.contains_key("root")));
        assert!(matches!(
            report.diagnostics.iter().next(),
            Some(Diagnostic::BadConfiguration { .. })
        ));
        assert!(parser.reload_config().is_err());
    }

    #[test]
    fn test_set_config_invalidates_cache() -> Result<()> {
        let mut parser = XmlParser::new(ParserMode::Custom)
            .with_config(config(r#"{"TREE": {"A": {}}, "A": "table,info"}"#));
        assert!(parser.reload_config()?.tree.contains("A"));

        parser.set_config(Some(config(r#"{"TREE": {"B": {}}, "B": "table,info"}"#)));
        let data = parser.parse_str(DOC);
        assert!(data.as_object().is_some_and(|o| o.contains_key("B")));
        Ok(())
    }

    #[test]
    fn test_dumps_raw_pretty_with_cdata() -> Result<()> {
        let parser = XmlParser::default();
        let data: Value = serde_json::from_str(
            r#"{"root": {"table": {"@name": "t", "rows": "1,2"}}}"#,
        )?;
        let xml = parser.dumps(&data, &DumpOptions::default())?;
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root>\n\t<table name=\"t\">\n\t\t<rows><![CDATA[1,2]]></rows>\n\t</table>\n</root>\n"
        );

        let plain = DumpOptions {
            pretty: false,
            cdata: false,
            ..DumpOptions::default()
        };
        assert!(parser.dumps(&data, &plain)?.ends_with("<root><table name=\"t\"><rows>1,2</rows></table></root>"));
        Ok(())
    }

    #[test]
    fn test_dump_writes_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.xml");
        let parser = XmlParser::default();
        let data: Value = serde_json::from_str(r#"{"T": {"a": "1"}}"#)?;
        let options = DumpOptions {
            pretty: false,
            ..DumpOptions::custom()
        };
        parser.dump(&data, &path, &options)?;
        assert_eq!(
            fs::read_to_string(&path)?,
            "<?xml version='1.0' encoding='utf-8'?><root><T><a>1</a></T></root>"
        );
        Ok(())
    }
}
