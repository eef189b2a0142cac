//! Runtime configuration for the assemble tool: a JSON config file, command
//! line flags, or a config file with flag overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assembler::AssemblyParams;
use crate::estimate::ModelFamily;

#[derive(Clone, Debug, Deserialize)]
pub struct AssembleConfig {
    /// Directory of decodable raster pieces.
    pub pieces_dir: PathBuf,
    /// Whitespace-separated anchor matrix file.
    pub anchor_transform: PathBuf,
    /// Where the composed mosaic PNG is written.
    pub output_path: PathBuf,
    pub canvas_width: usize,
    pub canvas_height: usize,
    /// File name of the anchor piece; defaults to the first piece in
    /// lexicographic order.
    #[serde(default)]
    pub anchor_piece: Option<String>,
    /// Optional JSON assembly report path.
    #[serde(default)]
    pub report_json: Option<PathBuf>,
    #[serde(default)]
    pub params: AssemblyParams,
}

pub fn load_config(path: &Path) -> Result<AssembleConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: AssembleConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

pub fn parse_cli(program: &str) -> Result<AssembleConfig, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args(program, &args)
}

fn parse_args(program: &str, args: &[String]) -> Result<AssembleConfig, String> {
    let mut pieces_dir: Option<PathBuf> = None;
    let mut anchor_transform: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut canvas_width: Option<usize> = None;
    let mut canvas_height: Option<usize> = None;
    let mut anchor_piece: Option<String> = None;
    let mut report_json: Option<PathBuf> = None;
    let mut params = AssemblyParams::default();

    // A config file (if any) supplies the baseline; flags override it.
    let mut base: Option<AssembleConfig> = None;
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--config" {
            let value = flag_value(program, args, i, "--config")?;
            base = Some(load_config(Path::new(value))?);
        }
        i += 1;
    }
    if let Some(cfg) = &base {
        pieces_dir = Some(cfg.pieces_dir.clone());
        anchor_transform = Some(cfg.anchor_transform.clone());
        output_path = Some(cfg.output_path.clone());
        canvas_width = Some(cfg.canvas_width);
        canvas_height = Some(cfg.canvas_height);
        anchor_piece = cfg.anchor_piece.clone();
        report_json = cfg.report_json.clone();
        params = cfg.params;
    }

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => return Err(usage(program)),
            "--config" => {
                i += 1; // handled in the first pass
            }
            "--pieces" => {
                pieces_dir = Some(PathBuf::from(flag_value(program, args, i, flag)?));
                i += 1;
            }
            "--anchor-transform" => {
                anchor_transform = Some(PathBuf::from(flag_value(program, args, i, flag)?));
                i += 1;
            }
            "--out" => {
                output_path = Some(PathBuf::from(flag_value(program, args, i, flag)?));
                i += 1;
            }
            "--width" => {
                canvas_width = Some(parse_flag(program, args, i, flag)?);
                i += 1;
            }
            "--height" => {
                canvas_height = Some(parse_flag(program, args, i, flag)?);
                i += 1;
            }
            "--anchor-piece" => {
                anchor_piece = Some(flag_value(program, args, i, flag)?.to_string());
                i += 1;
            }
            "--report-json" => {
                report_json = Some(PathBuf::from(flag_value(program, args, i, flag)?));
                i += 1;
            }
            "--model" => {
                params.model = match flag_value(program, args, i, flag)? {
                    "affine" => ModelFamily::Affine,
                    "homography" => ModelFamily::Homography,
                    other => return Err(format!("Unknown model family '{other}'")),
                };
                i += 1;
            }
            "--ratio" => {
                params.ratio_threshold = parse_flag(program, args, i, flag)?;
                i += 1;
            }
            "--max-iters" => {
                params.max_iters = parse_flag(program, args, i, flag)?;
                i += 1;
            }
            "--inlier-thresh" => {
                params.inlier_thresh = Some(parse_flag(program, args, i, flag)?);
                i += 1;
            }
            "--min-inliers" => {
                params.min_inliers = Some(parse_flag(program, args, i, flag)?);
                i += 1;
            }
            "--seed" => {
                params.seed = parse_flag(program, args, i, flag)?;
                i += 1;
            }
            other => return Err(format!("Unknown flag '{other}'\n\n{}", usage(program))),
        }
        i += 1;
    }

    let config = AssembleConfig {
        pieces_dir: pieces_dir.ok_or_else(|| missing(program, "--pieces"))?,
        anchor_transform: anchor_transform
            .ok_or_else(|| missing(program, "--anchor-transform"))?,
        output_path: output_path.ok_or_else(|| missing(program, "--out"))?,
        canvas_width: canvas_width.ok_or_else(|| missing(program, "--width"))?,
        canvas_height: canvas_height.ok_or_else(|| missing(program, "--height"))?,
        anchor_piece,
        report_json,
        params,
    };
    if config.canvas_width == 0 || config.canvas_height == 0 {
        return Err("Canvas dimensions must be positive".to_string());
    }
    Ok(config)
}

fn flag_value<'a>(
    program: &str,
    args: &'a [String],
    i: usize,
    flag: &str,
) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("Flag {flag} needs a value\n\n{}", usage(program)))
}

fn parse_flag<T: std::str::FromStr>(
    program: &str,
    args: &[String],
    i: usize,
    flag: &str,
) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    let raw = flag_value(program, args, i, flag)?;
    raw.parse()
        .map_err(|e| format!("Invalid value '{raw}' for {flag}: {e}"))
}

fn missing(program: &str, flag: &str) -> String {
    format!("Missing required flag {flag}\n\n{}", usage(program))
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} --pieces <dir> --anchor-transform <file> --out <png> \
         --width <px> --height <px> [options]\n\
         \n\
         Options:\n\
         \x20 --config <json>           baseline config file, flags override\n\
         \x20 --anchor-piece <name>     anchor file name (default: first by name)\n\
         \x20 --report-json <path>      write the assembly report as JSON\n\
         \x20 --model <affine|homography>\n\
         \x20 --ratio <f32>             descriptor ratio-test threshold (0.7)\n\
         \x20 --max-iters <n>           RANSAC iteration cap (1000)\n\
         \x20 --inlier-thresh <px>      inlier residual threshold (per-model default)\n\
         \x20 --min-inliers <n>         model acceptance floor (per-model default)\n\
         \x20 --seed <u64>              base RNG seed (0)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_args(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn minimal_flags_parse() {
        let args = to_args(&[
            "--pieces", "pieces", "--anchor-transform", "warp.txt", "--out", "mosaic.png",
            "--width", "741", "--height", "497",
        ]);
        let cfg = parse_args("assemble", &args).unwrap();
        assert_eq!(cfg.canvas_width, 741);
        assert_eq!(cfg.canvas_height, 497);
        assert_eq!(cfg.params.model, ModelFamily::Affine);
        assert!(cfg.anchor_piece.is_none());
    }

    #[test]
    fn tunables_override_defaults() {
        let args = to_args(&[
            "--pieces", "p", "--anchor-transform", "w.txt", "--out", "o.png", "--width", "10",
            "--height", "10", "--model", "homography", "--ratio", "0.8", "--min-inliers", "12",
            "--seed", "99",
        ]);
        let cfg = parse_args("assemble", &args).unwrap();
        assert_eq!(cfg.params.model, ModelFamily::Homography);
        assert_eq!(cfg.params.ratio_threshold, 0.8);
        assert_eq!(cfg.params.min_inliers, Some(12));
        assert_eq!(cfg.params.seed, 99);
    }

    #[test]
    fn missing_required_flag_is_an_error() {
        let args = to_args(&["--pieces", "p"]);
        assert!(parse_args("assemble", &args).is_err());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let args = to_args(&["--bogus"]);
        assert!(parse_args("assemble", &args).is_err());
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let args = to_args(&[
            "--pieces", "p", "--anchor-transform", "w", "--out", "o", "--width", "0",
            "--height", "5",
        ]);
        assert!(parse_args("assemble", &args).is_err());
    }
}
