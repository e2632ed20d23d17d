mod config;
mod planner;
mod store;
mod surname;
mod translit;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use config::Config;
use planner::{ChangeProposal, NameRecord};

#[derive(Parser, Debug)]
#[command(name = "pinbook")]
#[command(about = "Add Pinyin phonetic names to vdir contacts")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter configuration file
    Init(InitArgs),
    /// List proposed phonetic-name changes without writing anything
    Scan(ScanArgs),
    /// Write phonetic-name changes back to the contact files
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Directory containing .vcf contact files
    #[arg(value_name = "VDIR")]
    vdir: PathBuf,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Remove tone diacritics from computed phonetic names
    /// (overrides `strip_tone_marks` in the configuration)
    #[arg(long, default_value_t = false)]
    strip_tones: bool,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[arg(long, default_value_t = false)]
    strip_tones: bool,

    /// Record id to leave unchanged (repeatable); ids are printed by `scan`
    #[arg(long, value_name = "ID")]
    skip: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init(args) => handle_init(args, cli.config.as_deref()),
        Command::Scan(args) => {
            let config = config::load(cli.config.as_deref())?;
            println!("Loaded configuration from {}", config.config_path.display());
            handle_scan(args, &config)
        }
        Command::Apply(args) => {
            let config = config::load(cli.config.as_deref())?;
            println!("Loaded configuration from {}", config.config_path.display());
            handle_apply(args, &config)
        }
    }
}

fn handle_init(args: InitArgs, config_override: Option<&std::path::Path>) -> Result<()> {
    let path = match config_override {
        Some(path) => path.to_path_buf(),
        None => config::default_config_path()?,
    };
    config::init(&path, &args.vdir)?;
    println!("Wrote configuration to {}", path.display());
    Ok(())
}

fn handle_scan(args: ScanArgs, config: &Config) -> Result<()> {
    let strip_tones = args.strip_tones || config.strip_tone_marks;
    let (proposals, names) = plan(config, strip_tones)?;

    if proposals.is_empty() {
        println!("No contacts need phonetic names.");
        return Ok(());
    }

    println!("{} contact(s) would be updated:", proposals.len());
    for proposal in &proposals {
        println!("  {}", describe(proposal, &names));
    }
    Ok(())
}

fn handle_apply(args: ApplyArgs, config: &Config) -> Result<()> {
    let strip_tones = args.strip_tones || config.strip_tone_marks;
    let (mut proposals, names) = plan(config, strip_tones)?;

    for id in &args.skip {
        let mut matched = false;
        for proposal in proposals.iter_mut().filter(|p| &p.record_id == id) {
            proposal.selected = false;
            matched = true;
        }
        if !matched {
            eprintln!("warning: --skip {} matched no proposal", id);
        }
    }

    if proposals.iter().all(|p| !p.selected) {
        println!("No contacts need phonetic names.");
        return Ok(());
    }

    for proposal in proposals.iter().filter(|p| p.selected) {
        println!("  {}", describe(proposal, &names));
    }

    let report = store::commit(&proposals);
    for failure in &report.failed {
        eprintln!("warning: {failure}");
    }
    println!("Updated {} contact(s).", report.updated);
    Ok(())
}

/// Fetch the batch and plan updates, keeping the original name fields
/// around for display.
fn plan(
    config: &Config,
    strip_tones: bool,
) -> Result<(Vec<ChangeProposal>, HashMap<String, (String, String)>)> {
    let records = store::fetch_candidate_records(&config.vdir);

    let names: HashMap<String, (String, String)> = records
        .iter()
        .filter_map(|record| record.as_ref().ok())
        .map(|r: &NameRecord| (r.id.clone(), (r.family_name.clone(), r.given_name.clone())))
        .collect();

    let proposals = planner::plan_updates(records, strip_tones)?;
    Ok((proposals, names))
}

fn describe(proposal: &ChangeProposal, names: &HashMap<String, (String, String)>) -> String {
    let (family, given) = names
        .get(&proposal.record_id)
        .cloned()
        .unwrap_or_default();
    format!(
        "{}: {} {} -> {} {}",
        proposal.record_id,
        family,
        given,
        proposal.phonetic_family_name.as_deref().unwrap_or("-"),
        proposal.phonetic_given_name.as_deref().unwrap_or("-"),
    )
}
