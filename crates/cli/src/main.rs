use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use parkwatch_core::detection::domain::detection_source::DetectionSource;
use parkwatch_core::detection::infrastructure::jsonl_detection_reader::JsonlDetectionReader;
use parkwatch_core::detection::infrastructure::stride_detection_source::StrideDetectionSource;
use parkwatch_core::occupancy::domain::decision_rule::RuleKind;
use parkwatch_core::pipeline::lot_config::LotConfig;
use parkwatch_core::pipeline::monitor_lot_use_case::{LotReport, MonitorLotUseCase};

/// Parking slot occupancy from recorded vehicle detections.
#[derive(Parser)]
#[command(name = "parkwatch")]
struct Cli {
    /// Lot configuration (JSON): slot polygons, classifier and aggregator settings.
    config: PathBuf,

    /// Detections recorded by the external detector (JSON lines, one frame per line).
    detections: PathBuf,

    /// Detector class ids that count as vehicles (comma-separated; overrides config).
    #[arg(long, value_delimiter = ',')]
    target_classes: Option<Vec<u32>>,

    /// Minimum detection confidence (0.0-1.0; overrides config).
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Decision rule: majority or ema (overrides config).
    #[arg(long)]
    rule: Option<RuleKind>,

    /// Sliding window length for the majority rule (overrides config).
    #[arg(long)]
    window_size: Option<usize>,

    /// EMA smoothing factor in (0, 1] (overrides config).
    #[arg(long)]
    alpha: Option<f64>,

    /// Feed only every Nth frame to the pipeline (1 = every frame).
    #[arg(long, default_value = "1")]
    stride: usize,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = apply_overrides(LotConfig::load(&cli.config)?, &cli);
    let pipeline = config.build()?;
    log::info!(
        "Loaded {} slots from {}",
        pipeline.registry.len(),
        cli.config.display()
    );

    let reader: Box<dyn DetectionSource> = Box::new(JsonlDetectionReader::open(&cli.detections)?);
    let source: Box<dyn DetectionSource> = if cli.stride > 1 {
        Box::new(StrideDetectionSource::new(reader, cli.stride)?)
    } else {
        reader
    };

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\r{}", progress_line(current, total));
        true
    });

    let mut use_case = MonitorLotUseCase::new(
        source,
        Arc::new(pipeline.classifier),
        Arc::new(pipeline.registry),
        pipeline.aggregator,
        Some(progress),
    );
    let report = use_case.execute()?;
    eprintln!();

    if cli.json {
        println!("{}", render_json(config.name.as_deref(), &report)?);
    } else {
        println!("{}", render_table(config.name.as_deref(), &report));
    }
    Ok(())
}

/// `total` is 0 when the source cannot tell how many frames it holds.
fn progress_line(current: usize, total: usize) -> String {
    if total > 0 {
        format!("Processing frame {current}/{total}")
    } else {
        format!("Processing frame {current}")
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.config.exists() {
        return Err(format!("Config file not found: {}", cli.config.display()).into());
    }
    if !cli.detections.exists() {
        return Err(format!("Detections file not found: {}", cli.detections.display()).into());
    }
    if cli.stride == 0 {
        return Err("Stride must be at least 1".into());
    }
    if let Some(c) = cli.min_confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Minimum confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    if let Some(ref classes) = cli.target_classes {
        if classes.is_empty() {
            return Err("--target-classes needs at least one class id".into());
        }
    }
    Ok(())
}

fn apply_overrides(mut config: LotConfig, cli: &Cli) -> LotConfig {
    if let Some(ref classes) = cli.target_classes {
        config.classifier.target_classes = classes.clone();
    }
    if let Some(c) = cli.min_confidence {
        config.classifier.min_confidence = c;
    }
    if let Some(rule) = cli.rule {
        config.aggregator.rule = rule;
    }
    if let Some(w) = cli.window_size {
        config.aggregator.window_size = w;
    }
    if let Some(a) = cli.alpha {
        config.aggregator.alpha = a;
    }
    config
}

fn render_table(name: Option<&str>, report: &LotReport) -> String {
    let state = &report.state;
    let mut lines = Vec::new();
    if let Some(name) = name {
        lines.push(format!("Lot: {name}"));
    }
    lines.push(format!("Frames processed: {}", report.frames_processed));
    lines.push(format!("{:>6}  {:<8}  {:>5}", "Slot", "State", "Score"));
    for slot in &state.slots {
        let label = if slot.occupied { "occupied" } else { "free" };
        lines.push(format!("{:>6}  {label:<8}  {:>5.2}", slot.region_id, slot.score));
    }
    lines.push(format!(
        "Occupied: {}/{} ({} free)",
        state.occupied_count(),
        state.slots.len(),
        state.vacant_count()
    ));
    if report.ambiguous_assignments > 0 {
        lines.push(format!(
            "Warning: {} detections landed in overlapping slots",
            report.ambiguous_assignments
        ));
    }
    lines.join("\n")
}

fn render_json(name: Option<&str>, report: &LotReport) -> Result<String, serde_json::Error> {
    let value = serde_json::json!({
        "lot": name,
        "frames_processed": report.frames_processed,
        "occupied_count": report.occupied_count(),
        "vacant_count": report.state.vacant_count(),
        "occupied_ids": report.state.occupied_ids(),
        "ambiguous_assignments": report.ambiguous_assignments,
        "slots": report.state.slots,
    });
    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkwatch_core::occupancy::domain::occupancy_state::{OccupancyState, SlotState};

    const CONFIG: &str = r#"{
        "name": "test",
        "regions": [{"id": 1, "polygon": [[0, 0], [0, 10], [10, 10]]}],
        "classifier": {"target_classes": [2]}
    }"#;

    fn report() -> LotReport {
        LotReport {
            state: OccupancyState {
                slots: vec![
                    SlotState {
                        region_id: 1,
                        occupied: true,
                        score: 0.8,
                    },
                    SlotState {
                        region_id: 2,
                        occupied: false,
                        score: 0.0,
                    },
                ],
                frames_observed: 5,
            },
            frames_processed: 5,
            ambiguous_assignments: 0,
        }
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "parkwatch",
            "lot.json",
            "dets.jsonl",
            "--target-classes",
            "2,7",
            "--rule",
            "ema",
            "--alpha",
            "0.3",
        ]);
        let config = apply_overrides(LotConfig::from_json(CONFIG).unwrap(), &cli);
        assert_eq!(config.classifier.target_classes, vec![2, 7]);
        assert_eq!(config.aggregator.rule, RuleKind::Ema);
        assert_eq!(config.aggregator.alpha, 0.3);
        assert_eq!(config.aggregator.window_size, 5);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let cli = Cli::parse_from(["parkwatch", "lot.json", "dets.jsonl"]);
        let original = LotConfig::from_json(CONFIG).unwrap();
        assert_eq!(apply_overrides(original.clone(), &cli), original);
    }

    #[test]
    fn test_zero_stride_fails_validation() {
        let cli = Cli::parse_from(["parkwatch", "Cargo.toml", "Cargo.toml", "--stride", "0"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_progress_line_shows_total_when_known() {
        assert_eq!(progress_line(3, 10), "Processing frame 3/10");
        assert_eq!(progress_line(3, 0), "Processing frame 3");
    }

    #[test]
    fn test_table_lists_slots_and_count() {
        let table = render_table(Some("north"), &report());
        assert!(table.contains("Lot: north"));
        assert!(table.contains("occupied"));
        assert!(table.contains("Occupied: 1/2 (1 free)"));
        assert!(!table.contains("Warning"));
    }

    #[test]
    fn test_json_report() {
        let text = render_json(None, &report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["occupied_count"], 1);
        assert_eq!(value["occupied_ids"], serde_json::json!([1]));
        assert!(value["lot"].is_null());
    }
}
