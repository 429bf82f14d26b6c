mod catalog;
mod harness;
mod reports;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use hunt_engine::{EngineConfig, Hunt};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use catalog::{list_scenarios, resolve_scenarios, sample_hunt};
use harness::{ScenarioResult, ScriptRunner};
use script::Script;

#[derive(Debug, Parser)]
#[command(name = "hunt-tester", version = "0.1.0")]
#[command(about = "Scripted play-throughs for scavenger hunts built on hunt-engine")]
struct Args {
    /// Hunt definition to play (defaults to the bundled sample hunt)
    #[arg(long)]
    hunt: Option<PathBuf>,

    /// Run a JSON script instead of the built-in scenarios
    #[arg(long)]
    script: Option<PathBuf>,

    /// Engine configuration JSON (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output format for reports
    #[arg(long, default_value = "console", value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let hunt = load_hunt(args.hunt.as_deref())?;
    let config = load_config(args.config.as_deref())?;
    let scripts = select_scripts(&args)?;
    log::info!(
        "running {} script(s) against hunt '{}'",
        scripts.len(),
        hunt.id
    );

    let runner = ScriptRunner::new(args.verbose);
    let results: Vec<ScenarioResult> = scripts
        .iter()
        .map(|script| runner.run(&hunt, &config, script))
        .collect();

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🗺️  Hunt Scenario Tester".bright_cyan().bold());
    println!("{}", "========================".cyan());
}

fn load_hunt(path: Option<&Path>) -> Result<Hunt> {
    let Some(path) = path else {
        return sample_hunt();
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read hunt {}", path.display()))?;
    Hunt::from_json(&json).with_context(|| format!("failed to parse hunt {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json(&json)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

fn select_scripts(args: &Args) -> Result<Vec<Script>> {
    if let Some(path) = &args.script {
        return Ok(vec![Script::load(path)?]);
    }
    let scenarios = resolve_scenarios(&args.scenarios)?;
    Ok(scenarios.iter().map(catalog::BuiltinScenario::script).collect())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Hunt Scenario Results\n\n_No scenarios executed._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            reports::generate_console_report(&mut output_target, results, start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            hunt: None,
            script: None,
            config: None,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            report: "console".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hunt-tester-{}-{name}", std::process::id()))
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("skip-travel"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("empty.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("_No scenarios executed._"));
    }

    #[test]
    fn select_scripts_prefers_script_file() {
        let temp = temp_path("script.json");
        std::fs::write(&temp, r#"{ "name": "from-file", "steps": [] }"#).unwrap();
        let args = Args {
            script: Some(temp),
            scenarios: "does-not-exist".to_string(),
            ..base_args()
        };
        let scripts = select_scripts(&args).unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].name, "from-file");
    }

    #[test]
    fn select_scripts_rejects_unknown_scenarios() {
        let args = Args {
            scenarios: "smoke,unknown".to_string(),
            ..base_args()
        };
        let err = select_scripts(&args).unwrap_err();
        assert!(err.to_string().contains("unknown scenario 'unknown'"));
    }

    #[test]
    fn missing_hunt_file_names_the_path() {
        let err = load_hunt(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn defaults_load_bundled_hunt_and_config() {
        assert_eq!(load_hunt(None).unwrap().id, "central-park-loop");
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }
}
