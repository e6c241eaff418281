//! Annotate a DOCX with detections
//!
//! Restyles every occurrence of each detection value in the document body
//! (and, by default, headers, footers, footnotes and endnotes).
//!
//! Usage:
//!   annotate_docx <input.docx> <detections.json> <output.docx> [options]
//!
//! Options:
//!   --report FILE          write the JSON report to FILE
//!   --config FILE          load annotator configuration from JSON
//!   --join-policy POLICY   never | always | alnum_boundary
//!   --case-insensitive     match values case-insensitively
//!   --no-boundary          accept hits inside longer words
//!   --body-only            skip headers, footers and notes
//!   --verbose, -v          debug logging

use docx_annotator::{
    annotate_docx, AnnotationReport, AnnotatorConfig, Detection, JoinPolicy, MatchStatus,
};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

struct CliArgs {
    input: PathBuf,
    detections: PathBuf,
    output: PathBuf,
    report: Option<PathBuf>,
    config: Option<PathBuf>,
    join_policy: Option<JoinPolicy>,
    case_insensitive: bool,
    no_boundary: bool,
    body_only: bool,
    verbose: bool,
}

impl CliArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = Vec::new();
        let mut report = None;
        let mut config = None;
        let mut join_policy = None;
        let mut case_insensitive = false;
        let mut no_boundary = false;
        let mut body_only = false;
        let mut verbose = false;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--report" => {
                    i += 1;
                    report = Some(PathBuf::from(value_of(&args, i, "--report")?));
                },
                "--config" => {
                    i += 1;
                    config = Some(PathBuf::from(value_of(&args, i, "--config")?));
                },
                "--join-policy" => {
                    i += 1;
                    let value = value_of(&args, i, "--join-policy")?;
                    join_policy = Some(value.parse::<JoinPolicy>().map_err(|e| e.to_string())?);
                },
                "--case-insensitive" => case_insensitive = true,
                "--no-boundary" => no_boundary = true,
                "--body-only" => body_only = true,
                "--verbose" | "-v" => verbose = true,
                flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
                path => positional.push(PathBuf::from(path)),
            }
            i += 1;
        }

        let [input, detections, output]: [PathBuf; 3] = positional
            .try_into()
            .map_err(|_| "expected <input.docx> <detections.json> <output.docx>".to_string())?;

        Ok(Self {
            input,
            detections,
            output,
            report,
            config,
            join_policy,
            case_insensitive,
            no_boundary,
            body_only,
            verbose,
        })
    }

    fn annotator_config(&self) -> docx_annotator::Result<AnnotatorConfig> {
        let mut config = match &self.config {
            Some(path) => AnnotatorConfig::load(path)?,
            None => AnnotatorConfig::default(),
        };
        if let Some(policy) = self.join_policy {
            config = config.with_join_policy(policy);
        }
        if self.case_insensitive {
            config = config.with_case_insensitive(true);
        }
        if self.no_boundary {
            config = config.with_token_boundary(false);
        }
        if self.body_only {
            config = config.with_headers_footers(false);
        }
        Ok(config)
    }
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn run(args: &CliArgs) -> Result<AnnotationReport, Box<dyn std::error::Error>> {
    let config = args.annotator_config()?;
    let detections: Vec<Detection> = serde_json::from_str(&fs::read_to_string(&args.detections)?)?;
    let bytes = fs::read(&args.input)?;

    let (output, report) = annotate_docx(bytes, &detections, &config)?;
    fs::write(&args.output, output)?;

    if let Some(path) = &args.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }
    Ok(report)
}

fn print_summary(report: &AnnotationReport) {
    let count = |status: MatchStatus| {
        report
            .detections
            .iter()
            .filter(|d| d.status == status)
            .count()
    };

    println!("Detections:       {}", report.detections.len());
    println!("Styled:           {}", count(MatchStatus::Styled));
    println!("Normalized only:  {}", count(MatchStatus::NormalizedOnly));
    println!("Not found:        {}", count(MatchStatus::NotFound));
    println!("Empty values:     {}", count(MatchStatus::Empty));
    println!("Ranges restyled:  {}", report.styled_ranges());

    for outcome in report.not_found() {
        println!("  not found: [{}] {}", outcome.kind, outcome.value);
    }
}

fn main() -> ExitCode {
    let args = match CliArgs::from_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: annotate_docx <input.docx> <detections.json> <output.docx> [options]");
            return ExitCode::from(2);
        },
    };

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let start = Instant::now();
    match run(&args) {
        Ok(report) => {
            print_summary(&report);
            println!("Output: {} ({:?})", args.output.display(), start.elapsed());
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
