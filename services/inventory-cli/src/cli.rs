//! Command-line arguments

use api_client::{ListQuery, Resource, SortDirection};
use thiserror::Error;

pub const USAGE: &str = "usage: inventory-cli [--config PATH] <resource> [--search S] \
[--sort-by COLUMN] [--sort-dir asc|desc] [--page N] [--page-size N] [--metrics]";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing resource argument")]
    MissingResource,

    #[error("{0}")]
    UnknownResource(String),

    #[error("flag {0} needs a value")]
    MissingValue(String),

    #[error("invalid value for {flag}: {message}")]
    InvalidValue { flag: String, message: String },

    #[error("unexpected argument {0:?}")]
    Unexpected(String),
}

/// Parsed invocation. Unset query fields keep the list defaults.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: Option<String>,
    pub resource: Option<Resource>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Print Prometheus metrics to stderr after the fetch
    pub metrics: bool,
    pub help: bool,
}

impl CliArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            let mut value =
                |flag: &str| args.next().ok_or_else(|| UsageError::MissingValue(flag.into()));
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--metrics" => parsed.metrics = true,
                "--config" => parsed.config_path = Some(value("--config")?),
                "--search" => parsed.search = Some(value("--search")?),
                "--sort-by" => parsed.sort_by = Some(value("--sort-by")?),
                "--sort-dir" => {
                    let raw = value("--sort-dir")?;
                    parsed.sort_dir = Some(raw.parse::<SortDirection>().map_err(|message| {
                        UsageError::InvalidValue { flag: "--sort-dir".into(), message }
                    })?);
                }
                "--page" => parsed.page = Some(parse_number("--page", &value("--page")?)?),
                "--page-size" => {
                    parsed.page_size = Some(parse_number("--page-size", &value("--page-size")?)?)
                }
                flag if flag.starts_with('-') => return Err(UsageError::Unexpected(flag.into())),
                name if parsed.resource.is_none() => {
                    parsed.resource = Some(name.parse::<Resource>().map_err(UsageError::UnknownResource)?);
                }
                other => return Err(UsageError::Unexpected(other.into())),
            }
        }

        if parsed.resource.is_none() && !parsed.help {
            return Err(UsageError::MissingResource);
        }
        Ok(parsed)
    }

    /// Overlay the given flags onto a list query.
    pub fn apply(&self, query: &mut ListQuery) {
        if let Some(search) = &self.search {
            query.search = search.clone();
        }
        if let Some(sort_by) = &self.sort_by {
            query.sort_by = sort_by.clone();
        }
        if let Some(sort_dir) = self.sort_dir {
            query.sort_dir = sort_dir;
        }
        if let Some(page) = self.page {
            query.page = page;
        }
        if let Some(page_size) = self.page_size {
            query.page_size = page_size;
        }
    }
}

fn parse_number(flag: &str, raw: &str) -> Result<u32, UsageError> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(UsageError::InvalidValue {
            flag: flag.into(),
            message: format!("expected a positive integer, got {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::ListOptions;

    #[test]
    fn parses_resource_and_query_flags() {
        let args = CliArgs::parse([
            "assets",
            "--search",
            "dell laptop",
            "--sort-by",
            "name",
            "--sort-dir",
            "asc",
            "--page",
            "3",
            "--page-size",
            "20",
        ])
        .unwrap();

        assert_eq!(args.resource, Some(Resource::Assets));
        assert_eq!(args.search.as_deref(), Some("dell laptop"));
        assert_eq!(args.sort_dir, Some(SortDirection::Asc));
        assert_eq!(args.page, Some(3));
        assert_eq!(args.page_size, Some(20));
    }

    #[test]
    fn config_flag_may_precede_resource() {
        let args = CliArgs::parse(["--config", "/tmp/cli.toml", "users", "--metrics"]).unwrap();
        assert_eq!(args.config_path.as_deref(), Some("/tmp/cli.toml"));
        assert_eq!(args.resource, Some(Resource::Users));
        assert!(args.metrics);
    }

    #[test]
    fn resource_is_required() {
        assert_eq!(
            CliArgs::parse(["--page", "2"]).unwrap_err(),
            UsageError::MissingResource
        );
        assert!(CliArgs::parse(["--help"]).unwrap().help);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            CliArgs::parse(["assets", "--page", "0"]),
            Err(UsageError::InvalidValue { .. })
        ));
        assert!(matches!(
            CliArgs::parse(["assets", "--sort-dir", "sideways"]),
            Err(UsageError::InvalidValue { .. })
        ));
        assert_eq!(
            CliArgs::parse(["assets", "--search"]).unwrap_err(),
            UsageError::MissingValue("--search".into())
        );
        assert!(matches!(
            CliArgs::parse(["rooms"]),
            Err(UsageError::UnknownResource(_))
        ));
        assert_eq!(
            CliArgs::parse(["assets", "extra"]).unwrap_err(),
            UsageError::Unexpected("extra".into())
        );
    }

    #[test]
    fn apply_keeps_defaults_for_unset_flags() {
        let args = CliArgs::parse(["statuses", "--page", "2"]).unwrap();
        let mut query = ListQuery::from_options(&ListOptions::default());
        args.apply(&mut query);

        assert_eq!(query.page, 2);
        assert_eq!(query.sort_by, "id");
        assert_eq!(query.sort_dir, SortDirection::Desc);
        assert_eq!(query.page_size, 10);
        assert!(query.search.is_empty());
    }
}
