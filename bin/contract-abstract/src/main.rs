//! Thin CLI entry point (§6): reads an IR-source-spec fixture, runs the
//! analyzer over it, and writes the resulting meta document to a file or
//! stdout.

use std::fs::File;
use std::io::{self, Write as _};
use std::path::PathBuf;

use clap::Parser;
use contract_abstract_analyzer::{AnalyzerConfig, ContractAnalyzer};
use contract_abstract_ir::IrGraph;
use contract_abstract_telemetry_util::LogFormat;
use eyre::{Result, WrapErr};

/// Reconstructs a contract's storage schema and business logic from its IR.
#[derive(Parser, Debug)]
#[command(name = "contract-abstract", version)]
struct Args {
    /// Path to a JSON fixture deserializable into the in-memory IR model.
    ir_source_spec: PathBuf,

    /// Directory to write `<contract-name>.json` meta documents into;
    /// stdout is used when omitted.
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Tracing output shape.
    #[arg(long, default_value = "human")]
    log_format: LogFormat,

    /// Path to a `contract-abstract.toml` overriding the default resource
    /// budgets (§3.1).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    contract_abstract_eyre::install();
    contract_abstract_telemetry_util::init(args.log_format);

    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path).wrap_err_with(|| format!("reading config `{}`", path.display()))?;
            AnalyzerConfig::from_toml_str(&raw).wrap_err_with(|| format!("parsing config `{}`", path.display()))?
        }
        None => AnalyzerConfig::default(),
    };

    let raw = std::fs::read_to_string(&args.ir_source_spec).wrap_err_with(|| format!("reading IR source `{}`", args.ir_source_spec.display()))?;
    let graph: IrGraph = serde_json::from_str(&raw).wrap_err("parsing IR source as JSON")?;

    let analyzer = ContractAnalyzer::new(config);
    let report = analyzer.analyze(&graph).wrap_err("analyzing IR graph")?;

    for diagnostic in &report.diagnostics {
        tracing::warn!(kind = diagnostic.kind, site = ?diagnostic.site, "{}", diagnostic.message);
    }

    match args.output_path {
        Some(dir) => {
            std::fs::create_dir_all(&dir).wrap_err_with(|| format!("creating output directory `{}`", dir.display()))?;
            for (name, meta) in &report.document.contracts {
                let path = dir.join(format!("{name}.json"));
                let file = File::create(&path).wrap_err_with(|| format!("creating `{}`", path.display()))?;
                serde_json::to_writer_pretty(file, meta).wrap_err_with(|| format!("writing `{}`", path.display()))?;
            }
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, &report.document).wrap_err("writing meta document to stdout")?;
            writeln!(lock).ok();
        }
    }

    Ok(())
}
