use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, ValueEnum};
use contour_melody_rs::{
    aggregate_tracks, score_melodies, track_report, DecodeMethod, JsonContourProvider,
    MelodyConfig, MelodyDecoderBuilder, MelodyOutput, MelodySeries, Meta, Report,
    StandardMelodyEvaluator,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MethodChoice {
    Max,
    Viterbi,
}

impl MethodChoice {
    fn decode_method(self) -> DecodeMethod {
        match self {
            Self::Max => DecodeMethod::Max,
            Self::Viterbi => DecodeMethod::Viterbi,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "melody_report")]
#[command(about = "Decode melodies from classified contours and report accuracy")]
struct Args {
    /// Directory with one contour JSON file per track.
    #[arg(long, env = "MELODY_REPORT_CONTOURS_DIR")]
    contours_dir: PathBuf,
    /// Directory with `{"times": [...], "frequencies": [...]}` annotations named like the tracks.
    #[arg(long, env = "MELODY_REPORT_ANNOTATIONS_DIR")]
    annotations_dir: Option<PathBuf>,
    #[arg(long, env = "MELODY_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "MELODY_REPORT_THRESHOLD")]
    threshold: Option<f64>,
    #[arg(long, env = "MELODY_REPORT_PENALTY")]
    penalty: Option<f64>,
    #[arg(long, env = "MELODY_REPORT_METHOD", value_enum)]
    method: Option<MethodChoice>,
    #[arg(long, env = "MELODY_REPORT_OUT", default_value = "melody_report.json")]
    out: PathBuf,
    /// Embed the decoded time/frequency series in the report.
    #[arg(long, env = "MELODY_REPORT_INCLUDE_SERIES", default_value_t = false)]
    include_series: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("melody_report: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => MelodyConfig::load(path).map_err(|e| e.to_string())?,
        None => MelodyConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.probability_threshold = threshold;
    }
    if let Some(penalty) = args.penalty {
        config.penalty = penalty;
    }
    if let Some(method) = args.method {
        config.method = method.decode_method();
    }

    let decoder = MelodyDecoderBuilder::new(config)
        .build()
        .map_err(|e| e.to_string())?;

    let track_files = list_json_files(&args.contours_dir)?;
    if track_files.is_empty() {
        return Err(format!(
            "no contour files found in {}",
            args.contours_dir.display()
        ));
    }

    let progress = ProgressBar::new(track_files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut outputs: BTreeMap<String, Option<MelodyOutput>> = BTreeMap::new();
    for (track_id, path) in &track_files {
        progress.set_message(track_id.clone());
        let provider = JsonContourProvider::new(path);
        let output = match decoder.decode_from(&provider) {
            Ok(output) => Some(output),
            Err(err) => {
                tracing::warn!(track = track_id.as_str(), error = %err, "decode failed; skipping track");
                None
            }
        };
        outputs.insert(track_id.clone(), output);
        progress.inc(1);
    }
    progress.finish_with_message("decoded");

    let scores = match args.annotations_dir.as_ref() {
        Some(dir) => {
            let annotations = load_annotations(dir, outputs.keys())?;
            let annotated: BTreeMap<String, Option<MelodyOutput>> = outputs
                .iter()
                .filter(|(id, _)| annotations.contains_key(*id))
                .map(|(id, output)| (id.clone(), output.clone()))
                .collect();
            score_melodies(&annotated, &annotations, &StandardMelodyEvaluator)
                .map_err(|e| e.to_string())?
        }
        None => BTreeMap::new(),
    };

    let tracks = outputs
        .iter()
        .filter_map(|(id, output)| {
            let output = output.as_ref()?;
            Some(track_report(id, output, scores.get(id).copied(), args.include_series))
        })
        .collect::<Vec<_>>();
    let aggregate = aggregate_tracks(&tracks);
    let report = Report {
        schema_version: contour_melody_rs::report::REPORT_SCHEMA_VERSION,
        meta: Meta::new(Utc::now().to_rfc3339(), decoder.config(), tracks.len()),
        tracks,
        aggregate,
    };

    let json = serde_json::to_string_pretty(&report).map_err(|e| format!("serialize report: {e}"))?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("create {}: {e}", parent.display()))?;
    }
    fs::write(&args.out, json).map_err(|e| format!("write {}: {e}", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn list_json_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, String> {
    let entries = fs::read_dir(dir).map_err(|e| format!("read {}: {e}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| format!("read {}: {e}", dir.display()))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}

fn load_annotations<'a>(
    dir: &Path,
    track_ids: impl Iterator<Item = &'a String>,
) -> Result<BTreeMap<String, MelodySeries>, String> {
    let mut annotations = BTreeMap::new();
    for id in track_ids {
        let path = dir.join(format!("{id}.json"));
        if !path.exists() {
            tracing::info!(track = id.as_str(), "no annotation; track left unscored");
            continue;
        }
        let data = fs::read_to_string(&path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let series: MelodySeries =
            serde_json::from_str(&data).map_err(|e| format!("parse {}: {e}", path.display()))?;
        annotations.insert(id.clone(), series);
    }
    Ok(annotations)
}
