use anyhow::Result;
use clap::Parser;
use cocoviz::{Args, helpers::setup_logging, run_analysis};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args)?;
    let mut writer = std::io::stdout().lock();
    run_analysis(args, &mut writer)
}
