//! CAS Install CLI
//!
//! Usage:
//!   cas_install
//!   cas_install --skip-remote
//!   cas_install --root ../cas-foundation --dry-run

use cas_launch::cli::{parse_env_arguments, project_root, InstallArgs, ParseOutcome};
use cas_launch::{logging, Bootstrap, SystemRunner};
use std::path::Path;

#[tokio::main]
async fn main() {
    logging::init();

    let args = match parse_env_arguments::<InstallArgs>() {
        Ok(ParseOutcome::Parsed(args)) => args,
        Ok(ParseOutcome::Help(usage)) => {
            println!("{}", usage);
            return;
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    logging::set_verbose(args.verbose);

    let root = project_root(args.root.as_deref().map(Path::new));
    let bootstrap = Bootstrap::new(SystemRunner, &root)
        .with_steps(Bootstrap::<SystemRunner>::standard_steps(args.skip_remote));

    if args.dry_run {
        println!("Install steps in {}:", root.display());
        for (i, step) in bootstrap.steps().iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
        return;
    }

    match bootstrap.run().await {
        Ok(report) => log::info!(
            "All submodules processed ({} steps completed, {} with warnings)",
            report.completed.len(),
            report.warnings.len()
        ),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
