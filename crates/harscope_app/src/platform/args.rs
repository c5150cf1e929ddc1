use std::path::PathBuf;

use clap::Parser;
use harscope_core::CategoryFilter;

/// Inspect a HAR capture: filter it, print the matching requests and their
/// timeline, and optionally save the selection as a new archive.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "harscope", version, about)]
pub struct Options {
    /// HAR file to load.
    pub path: PathBuf,

    /// Keep entries whose URL, headers, cookies or bodies contain TEXT.
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Keep one category (fetch, doc, css, js, img, media, manifest, cors, ws, wasm, other).
    #[arg(long, value_name = "CAT", default_value = "all")]
    pub category: CategoryFilter,

    /// Keep failed requests only.
    #[arg(long = "errors")]
    pub errors_only: bool,

    /// Sort slowest first.
    #[arg(long = "slowest")]
    pub slowest_first: bool,

    /// Timeline width in columns.
    #[arg(
        long = "width",
        value_name = "N",
        default_value_t = 60,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub chart_width: u16,

    /// Save the visible entries as a HAR file in DIR.
    #[arg(long = "export", value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::Options;
    use clap::Parser;
    use harscope_core::{Category, CategoryFilter};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn parses_every_flag() {
        let options = Options::try_parse_from([
            "harscope",
            "session.har",
            "--filter",
            "users",
            "--category",
            "img",
            "--errors",
            "--slowest",
            "--width",
            "80",
            "--export",
            "out",
        ])
        .unwrap();

        assert_eq!(options.path, PathBuf::from("session.har"));
        assert_eq!(options.filter.as_deref(), Some("users"));
        assert_eq!(options.category, CategoryFilter::Only(Category::Img));
        assert!(options.errors_only && options.slowest_first);
        assert_eq!(options.chart_width, 80);
        assert_eq!(options.export_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn defaults_apply_without_flags() {
        let options = Options::try_parse_from(["harscope", "a.har"]).unwrap();
        assert_eq!(options.category, CategoryFilter::All);
        assert_eq!(options.chart_width, 60);
        assert!(!options.errors_only);
    }

    #[test]
    fn rejects_bad_input() {
        for args in [
            vec!["harscope"],
            vec!["harscope", "a.har", "--width", "0"],
            vec!["harscope", "a.har", "--category", "fonts"],
            vec!["harscope", "a.har", "--filter"],
            vec!["harscope", "a.har", "b.har"],
        ] {
            assert!(Options::try_parse_from(args).is_err());
        }
    }
}
