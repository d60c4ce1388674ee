use clap::ValueEnum;
use std::fmt;

use drivedex_types::{FileFilter, ResumePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive for the tracing env-filter
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_directive())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum FilterArg {
    Pdf,
    Docs,
    All,
}

impl From<FilterArg> for FileFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Pdf => FileFilter::Pdf,
            FilterArg::Docs => FileFilter::GoogleDocs,
            FilterArg::All => FileFilter::All,
        }
    }
}

impl fmt::Display for FilterArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterArg::Pdf => write!(f, "pdf"),
            FilterArg::Docs => write!(f, "docs"),
            FilterArg::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OnFailureArg {
    Discard,
    KeepLastSeen,
}

impl From<OnFailureArg> for ResumePolicy {
    fn from(arg: OnFailureArg) -> Self {
        match arg {
            OnFailureArg::Discard => ResumePolicy::Discard,
            OnFailureArg::KeepLastSeen => ResumePolicy::KeepLastSeen,
        }
    }
}

impl fmt::Display for OnFailureArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnFailureArg::Discard => write!(f, "discard"),
            OnFailureArg::KeepLastSeen => write!(f, "keep-last-seen"),
        }
    }
}
