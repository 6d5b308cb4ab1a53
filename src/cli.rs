use std::ffi::OsString;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::dates::default_bounds;
use crate::presenter::AvailabilityQuery;

const ABOUT: &str = "Utilizes Redeam API to obtain availability for specified products.\n\n\
If no date arguments are specified, search will default to two weeks out from today's date.";

// Single-dash spellings accepted alongside the long flags
const SHORT_FORMS: &[(&str, &str)] = &[
    ("-pid", "--productid"),
    ("-sid", "--supplierid"),
    ("-sdate", "--startdate"),
    ("-edate", "--enddate"),
];

#[derive(Parser, Debug)]
#[command(name = "get-availability", about = ABOUT, long_about = None)]
pub struct Cli {
    /// Product to search (-pid). For testing, use: 02f0c6cb-77ae-4fcc-8f4d-99bc0c3bee18
    #[arg(long = "productid", value_name = "PRODUCTID")]
    pub product_id: String,

    /// Supplier offering the product (-sid). For testing, use: fc49b925-6942-4df8-954b-ed7df10adf7e
    #[arg(long = "supplierid", value_name = "SUPPLIERID")]
    pub supplier_id: String,

    /// YYYY-MM-DD formatting (-sdate). Defaults to today's date
    #[arg(long = "startdate", value_name = "STARTDATE")]
    pub start_date: Option<String>,

    /// YYYY-MM-DD formatting (-edate). Defaults to two weeks from today's date
    #[arg(long = "enddate", value_name = "ENDDATE")]
    pub end_date: Option<String>,

    /// INI file holding the [redeam_api] credentials
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parses the process arguments. With nothing but the program name the
    /// help text is requested instead of reporting missing flags.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = normalize_args(args.into_iter().map(Into::into));
        if args.len() <= 1 {
            args.push(OsString::from("--help"));
        }
        Cli::try_parse_from(args)
    }

    /// Raw start/end strings, falling back to now and now + 14 days.
    pub fn raw_bounds(&self, now: DateTime<Utc>) -> (String, String) {
        let (default_start, default_end) = default_bounds(now);
        (
            self.start_date.clone().unwrap_or(default_start),
            self.end_date.clone().unwrap_or(default_end),
        )
    }

    pub fn query(&self) -> AvailabilityQuery {
        AvailabilityQuery {
            supplier_id: self.supplier_id.clone(),
            product_id: self.product_id.clone(),
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Rewrites `-pid`, `-sid`, `-sdate` and `-edate` (also in `-flag=value`
/// form) to their long spellings. Nothing after `--` is touched, and
/// arguments that are not valid UTF-8 are left for clap to report.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            if arg.to_str() == Some("--") {
                passthrough = true;
                return arg;
            }
            arg.to_str().and_then(expand_short_form).unwrap_or(arg)
        })
        .collect()
}

fn expand_short_form(arg: &str) -> Option<OsString> {
    let (flag, value) = match arg.split_once('=') {
        Some((flag, value)) => (flag, Some(value)),
        None => (arg, None),
    };
    let (_, long) = SHORT_FORMS.iter().find(|(short, _)| *short == flag)?;
    Some(match value {
        Some(value) => OsString::from(format!("{}={}", long, value)),
        None => OsString::from(*long),
    })
}
