//! quire - logical structure synthesis for digitized page sequences

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quire::{
    read_mets, read_page, write_mets, ClassifierRules, RuleSet, StructureMap, SynthesisMode,
    Synthesizer, TypeTag,
};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version, about = "Synthesize logical document structure from segmented pages", long_about = None)]
#[command(after_help = "EXAMPLES:
    quire mets.xml pages/*.xml                  Link pages into the logical structure
    quire mets.xml pages/*.xml --mode pointers  Attach content pointers instead
    quire mets.xml pages/*.xml -o out.xml       Write the result elsewhere")]
struct Cli {
    /// Structure container (METS). Started empty if the file does not exist
    #[arg(value_name = "METS")]
    mets: PathBuf,

    /// Page layout files, in page order
    #[arg(value_name = "PAGES", required = true)]
    pages: Vec<PathBuf>,

    /// Output path (defaults to rewriting the container in place)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output representation
    #[arg(short, long, default_value = "links", value_parser = ["links", "pointers"])]
    mode: String,

    /// Subordination rule set (JSON), overriding the built-in defaults
    #[arg(long, value_name = "JSON")]
    rules: Option<PathBuf>,

    /// Region classifier configuration (JSON)
    #[arg(long, value_name = "JSON")]
    classifier: Option<PathBuf>,

    /// Structural type for heading regions (shorthand for --classifier)
    #[arg(long, value_name = "TAG", conflicts_with = "classifier")]
    heading_type: Option<String>,

    /// Suppress the summary line
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> quire::Result<()> {
    let mode: SynthesisMode = cli.mode.parse()?;
    let rules = match &cli.rules {
        Some(path) => RuleSet::load(path)?,
        None => RuleSet::default(),
    };
    let mut classifier = match &cli.classifier {
        Some(path) => ClassifierRules::load(path)?,
        None => ClassifierRules::default(),
    };
    if let Some(tag) = &cli.heading_type {
        classifier.heading_type = TypeTag::new(tag);
        classifier.validate()?;
    }

    let mut map = if cli.mets.exists() {
        read_mets(&cli.mets)?
    } else {
        StructureMap::default()
    };

    let mut synth = Synthesizer::new(&mut map.tree, &mut map.links, mode, &rules)?;
    for page in &cli.pages {
        for segment in read_page(page, &classifier)? {
            synth.process(&segment);
        }
    }
    let report = synth.finish();

    let output = cli.output.as_ref().unwrap_or(&cli.mets);
    write_mets(output, &map)?;

    if !cli.quiet {
        println!(
            "{}: {} divisions created, {} merged, {} attached, {} dropped",
            output.display(),
            report.created,
            report.merged,
            report.attached,
            report.dropped.len()
        );
    }

    Ok(())
}
