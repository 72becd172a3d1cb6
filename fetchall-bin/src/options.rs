use crate::input::InputSource;
use crate::parse::parse_status_code;
use crate::verbosity::Verbosity;
use anyhow::{Context, Result, anyhow};
use clap::builder::PossibleValuesParser;
use clap::{Parser, builder::TypedValueParser};
use const_format::{concatcp, formatcp};
use fetchall_lib::{DEFAULT_BUFFER, DEFAULT_METHOD, DEFAULT_USER_AGENT};
use http::{
    HeaderMap,
    header::{HeaderName, HeaderValue},
};
use serde::{Deserialize, Deserializer};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::{fs, path::PathBuf, str::FromStr};
use strum::{Display, EnumIter, EnumString, VariantNames};

pub(crate) const FETCHALL_CONFIG_FILE: &str = "fetchall.toml";

/// Read requests from stdin if no input is given
pub(crate) const STDIN_INPUT: &str = "-";

const DEFAULT_TIMEOUT_SECS: usize = 20;

// clap takes defaults as `&str`
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS);
const BUFFER_STR: &str = concatcp!(DEFAULT_BUFFER);
// We use a custom help message here because we want to show the default
// value of the config file, but also be able to check if the user has
// provided a custom value. If they didn't, we won't throw an error if
// the file doesn't exist.
const HELP_MSG_CONFIG_FILE: &str = formatcp!(
    "Configuration file to use\n\n[default: {}]",
    FETCHALL_CONFIG_FILE,
);

/// The format to use for the final summary
#[derive(
    Debug, Deserialize, Default, Clone, Display, EnumIter, EnumString, VariantNames, PartialEq,
)]
#[non_exhaustive]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub(crate) enum StatsFormat {
    #[default]
    Compact,
    Json,
}

/// The different formatter modes
///
/// This decides over whether to use color or plain text for the output.
#[derive(
    Debug, Deserialize, Default, Clone, Display, EnumIter, EnumString, VariantNames, PartialEq,
)]
#[non_exhaustive]
pub(crate) enum OutputMode {
    /// Plain text output.
    ///
    /// This is the most basic output mode for terminals that do not support
    /// color. It can also be helpful for scripting or when you want
    /// to pipe the output to another program.
    #[serde(rename = "plain")]
    #[strum(serialize = "plain", ascii_case_insensitive)]
    Plain,

    /// Colorful output.
    ///
    /// This mode uses colors to highlight the outcome of the requests.
    #[serde(rename = "color")]
    #[strum(serialize = "color", ascii_case_insensitive)]
    #[default]
    Color,
}

impl OutputMode {
    /// Returns `true` if the response format is `Plain`
    pub(crate) const fn is_plain(&self) -> bool {
        matches!(self, OutputMode::Plain)
    }
}

/// Take the config file value of every listed key which the command line
/// left at its default
macro_rules! fill_defaults {
    ($cli:ident, $defaults:ident; $( $key:ident ),* $(,)?) => {
        $(
            if $cli.$key == $defaults.$key {
                $cli.$key = $key;
            }
        )*
    };
}

/// A custom request header given as `Name: Value`
pub(crate) type Header = (HeaderName, HeaderValue);

/// Parse a `Name: Value` pair.
///
/// Whitespace around name and value is ignored. The value may contain
/// further colons. Error messages never repeat the value, which may be a
/// credential.
fn parse_header(raw: &str) -> Result<Header> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("Expected a header in the format `Name: Value`"))?;
    header_pair(name.trim(), value.trim())
}

fn header_pair(name: &str, value: &str) -> Result<Header> {
    let name =
        HeaderName::from_str(name).map_err(|e| anyhow!("Invalid header name `{name}`: {e}"))?;
    let value =
        HeaderValue::from_str(value).map_err(|e| anyhow!("Invalid value for header `{name}`: {e}"))?;
    Ok((name, value))
}

/// Headers in the config file are a table of names and values
fn deserialize_headers<'de, D>(deserializer: D) -> Result<Vec<Header>, D::Error>
where
    D: Deserializer<'de>,
{
    HashMap::<String, String>::deserialize(deserializer)?
        .iter()
        .map(|(name, value)| header_pair(name, value).map_err(serde::de::Error::custom))
        .collect()
}

/// fetchall sends a stream of HTTP requests concurrently and reports the
/// outcome of each one as soon as it completes.
///
/// Redirects are followed with the same method and body as the original
/// request. Press Ctrl-C to stop reading new requests; requests which are
/// already running are allowed to finish.
#[derive(Parser, Debug)]
#[command(version, about, next_display_order = None)]
pub(crate) struct FetchallOptions {
    /// Inputs to read requests from.
    #[arg(
        name = "inputs",
        default_value = STDIN_INPUT,
        long_help = "Inputs to read requests from. These can be:
files with one request per line, standard input (`-`), or literal
http(s) URLs (e.g. `https://example.com`). Reads from standard input
if no input is given.

Each line of a file holds one request in the format `[METHOD] URL [BODY]`.
The body is the rest of the line after the URL. Empty lines and lines
starting with '#' are ignored.

NOTE: Use `--` to separate inputs from options that allow multiple arguments."
    )]
    pub(crate) raw_inputs: Vec<String>,

    /// Configuration file to use
    #[arg(short, long = "config")]
    #[arg(help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) config: Config,
}

impl FetchallOptions {
    /// Get parsed inputs from options.
    pub(crate) fn inputs(&self) -> Vec<InputSource> {
        self.raw_inputs
            .iter()
            .map(|raw_input| InputSource::new(raw_input))
            .collect()
    }
}

/// The main configuration for fetchall
#[derive(Parser, Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Verbose program output
    #[clap(flatten)]
    pub(crate) verbose: Verbosity,

    /// Request method for lines which do not name one
    // Using `-X` as a short param similar to curl
    #[arg(short = 'X', long, default_value = DEFAULT_METHOD)]
    pub(crate) method: String,

    /// Set custom header for requests
    #[arg(
        short = 'H',
        long = "header",
        action = clap::ArgAction::Append,
        value_parser = parse_header,
        value_name = "HEADER:VALUE",
        long_help = "Set custom header for requests

Headers are given in the format 'Name: Value', e.g. 'Accept: text/html'.
Repeat the flag to send several headers. A header given on the command
line replaces a header of the same name from the configuration file.
The headers are sent with every request, including redirect hops."
    )]
    #[serde(deserialize_with = "deserialize_headers")]
    pub(crate) header: Vec<Header>,

    /// User agent
    #[arg(short, long, default_value = DEFAULT_USER_AGENT)]
    pub(crate) user_agent: String,

    /// Timeout in seconds for each attempt, from connect to body finished.
    /// Use 0 to disable the timeout.
    #[arg(short, long, default_value = &TIMEOUT_STR, verbatim_doc_comment)]
    pub(crate) timeout: usize,

    /// Proceed for server connections considered insecure (invalid TLS)
    #[arg(short, long)]
    pub(crate) insecure: bool,

    /// Maximum number of redirects to follow per request.
    /// Redirects are followed without limit if not set.
    #[arg(short, long, verbatim_doc_comment)]
    pub(crate) max_redirects: Option<usize>,

    /// Maximum number of requests to run at the same time.
    /// There is no limit if not set.
    #[arg(long, verbatim_doc_comment)]
    pub(crate) max_concurrency: Option<usize>,

    /// Number of finished results which may queue up before requests
    /// have to wait for them to be printed
    #[arg(long, default_value = &BUFFER_STR)]
    pub(crate) buffer: usize,

    /// Number of threads to utilize.
    /// Defaults to number of cores available to the system
    #[arg(short = 'T', long)]
    pub(crate) threads: Option<usize>,

    /// A comma-separated list of accepted status codes for valid responses
    #[arg(
        short,
        long,
        value_delimiter = ',',
        value_parser = parse_status_code,
        long_help = "A comma-separated list of accepted status codes.

Responses with a status below 400 always count as successful. Use this to
accept other status codes as well, e.g. '--accept 404,429'."
    )]
    pub(crate) accept: Vec<u16>,

    /// Output file of the summary
    #[arg(short, long, value_parser)]
    pub(crate) output: Option<PathBuf>,

    /// Set the output display mode. Determines how results are presented in the terminal
    #[arg(long, default_value = "color", value_parser = PossibleValuesParser::new(OutputMode::VARIANTS).map(|s| s.parse::<OutputMode>().unwrap()))]
    pub(crate) mode: OutputMode,

    /// Output format of the final summary
    #[arg(short, long, default_value = "compact", value_parser = PossibleValuesParser::new(StatsFormat::VARIANTS).map(|s| s.parse::<StatsFormat>().unwrap()))]
    pub(crate) format: StatsFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: Verbosity::default(),
            method: DEFAULT_METHOD.to_string(),
            header: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            insecure: false,
            max_redirects: None,
            max_concurrency: None,
            buffer: DEFAULT_BUFFER,
            threads: None,
            accept: Vec::new(),
            output: None,
            mode: OutputMode::default(),
            format: StatsFormat::default(),
        }
    }
}

impl Config {
    /// All custom headers as a map. Repeated names keep every value.
    pub(crate) fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.header.len());
        for (name, value) in &self.header {
            headers.append(name, value.clone());
        }
        headers
    }

    /// Add the headers of the config file whose names were not given on
    /// the command line
    fn merge_headers(&mut self, toml: Vec<Header>) {
        let from_cli: HashSet<HeaderName> =
            self.header.iter().map(|(name, _)| name.clone()).collect();
        let mut merged: Vec<Header> = toml
            .into_iter()
            .filter(|(name, _)| !from_cli.contains(name))
            .collect();
        merged.append(&mut self.header);
        self.header = merged;
    }

    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        // Read configuration file
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }

    /// Merge the configuration from TOML into the CLI configuration.
    ///
    /// Values given on the command line win. A value which is still at its
    /// default is taken from the config file.
    pub(crate) fn merge(&mut self, toml: Config) {
        // No `..`, so a new field cannot be forgotten here
        let Config {
            verbose,
            method,
            header,
            user_agent,
            timeout,
            insecure,
            max_redirects,
            max_concurrency,
            buffer,
            threads,
            accept,
            output,
            mode,
            format,
        } = toml;

        // Headers are combined by name instead of replaced as a whole
        self.merge_headers(header);

        let defaults = Config::default();
        fill_defaults!(
            self, defaults;
            verbose,
            method,
            user_agent,
            timeout,
            insecure,
            max_redirects,
            max_concurrency,
            buffer,
            threads,
            accept,
            output,
            mode,
            format,
        );
    }
}
