use std::path::PathBuf;

use clap::Args;

use geophylo::error::{Error, Result};
use geophylo::model::instance::LeaderType;

use crate::output::write_output;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Path to a Newick file with the phylogenetic tree.
    pub tree: PathBuf,

    /// Path to a GeoJSON (.geojson/.json) or CSV file with the sites.
    pub geo: PathBuf,

    /// Output JSON to a file (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Padding around the sites, in percent of the area they enclose.
    #[arg(short, long, default_value = "20")]
    pub padding: String,

    /// Leader type: s (straight) or po (orthogonal).
    #[arg(short = 'l', long = "ltype", default_value = "s")]
    pub ltype: String,

    /// Geo property to connect leaves and sites by (default: order of appearance).
    #[arg(short, long, default_value = "")]
    pub connect: String,
}

pub fn run(args: ParseArgs) -> Result<()> {
    // The instance record does not carry the leader type, but an unknown
    // value should still fail here rather than at optimize time.
    args.ltype.parse::<LeaderType>()?;

    let padding_percent: f64 = args.padding.parse().map_err(|_| Error::ConfigInvalid {
        field: "padding",
        message: format!("'{}' is not a number", args.padding),
    })?;

    let newick = std::fs::read_to_string(&args.tree).map_err(|e| Error::InputParse {
        input: "tree file",
        message: format!("{}: {e}", args.tree.display()),
    })?;

    let geo_raw = std::fs::read_to_string(&args.geo).map_err(|e| Error::InputParse {
        input: "geo file",
        message: format!("{}: {e}", args.geo.display()),
    })?;
    let extension = args.geo.extension().and_then(|e| e.to_str()).unwrap_or("");
    let geo = if extension.eq_ignore_ascii_case("csv") {
        geophylo::input::geo::csv_to_feature_collection(&geo_raw)?
    } else {
        serde_json::from_str(&geo_raw).map_err(|e| Error::InputParse {
            input: "geojson",
            message: e.to_string(),
        })?
    };

    let title = args.tree.display().to_string();
    let instance = geophylo::build_instance(&newick, &title, &geo, padding_percent / 100.0, &args.connect)?;

    let json = serde_json::to_string(&instance)
        .map_err(|e| Error::Internal(format!("instance serialization failed: {e}")))?;
    write_output(&json, args.output.as_deref())
}
