use std::{io, path::PathBuf};

use anyhow::Context;
use miette::Report;

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },
    Document {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    Core {
        command: &'static str,
        source: dialectkit_core::Error,
    },
    DialectDisabled(&'static str),
}

impl CliError {
    pub(crate) fn core(command: &'static str) -> impl FnOnce(dialectkit_core::Error) -> Self {
        move |source| Self::Core { command, source }
    }
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::ReadFile { path, source } => {
            let report = report_with_context(source, format!("while reading `{}`", path.display()));
            format!("[io] {report}")
        }
        CliError::Document { path, source } => {
            let report = report_with_context(source, format!("while parsing `{}`", path.display()));
            format!("[configuration] {report}")
        }
        CliError::Core { command, source } => {
            let category = core_category(&source);
            let report = report_with_context(source, format!("while running `{command}`"));
            format!("[{category}] {report}")
        }
        CliError::DialectDisabled(dialect) => format!(
            "[configuration] dialect `{dialect}` is not enabled in this build; rebuild with `--features {dialect}`"
        ),
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: std::fmt::Display + Send + Sync + 'static,
{
    let error = Err::<(), E>(source).context(context).err();
    match error {
        Some(error) => miette::miette!("{error:#}"),
        None => miette::miette!("unknown error"),
    }
}

fn core_category(error: &dialectkit_core::Error) -> &'static str {
    match error {
        dialectkit_core::Error::Configuration(_) => "configuration",
        dialectkit_core::Error::Connectivity(_) => "connectivity",
        dialectkit_core::Error::Unsupported(_) => "unsupported",
        dialectkit_core::Error::Execute(_) => "execute",
        dialectkit_core::Error::Schema(_) => "schema",
        dialectkit_core::Error::Generate(_) => "generate",
    }
}
