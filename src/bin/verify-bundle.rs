use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use tracing::{error, info};

use evidence_connector::kernel::{load_bundle_from_file, verify_bundle};

fn main() -> Result<()> {
    let matches = Command::new("verify-bundle")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify the hash chain and root hash of an evidence bundle")
        .arg(
            Arg::new("bundle")
                .short('b')
                .long("bundle")
                .value_name("PATH")
                .help("Path to bundle JSON file")
                .required(true),
        )
        .arg(
            Arg::new("expected-root")
                .short('r')
                .long("expected-root")
                .value_name("HASH")
                .help("Root hash the bundle must carry"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let bundle_path = matches
        .get_one::<String>("bundle")
        .ok_or_else(|| anyhow!("--bundle is required"))?;
    let expected_root = matches.get_one::<String>("expected-root");

    if let Err(e) = verify_bundle_file(bundle_path, expected_root, verbose) {
        error!("Bundle verification failed: {}", e);
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }

    println!("✓ Bundle verification completed successfully");
    Ok(())
}

fn verify_bundle_file(path: &str, expected_root: Option<&String>, verbose: bool) -> Result<()> {
    info!("Verifying bundle: {}", path);
    let bundle = load_bundle_from_file(path)?;

    if verbose {
        println!("Bundle {} ({} items)", bundle.bundle_id, bundle.items().len());
    }

    let report = verify_bundle(&bundle);
    if !report.is_valid() {
        for failure in &report.failures {
            println!("  ✗ {}", failure);
        }
        return Err(anyhow!("{} integrity failures", report.failures.len()));
    }

    if let Some(expected) = expected_root {
        if report.recomputed_root != *expected {
            return Err(anyhow!(
                "Root hash mismatch. Expected: {}, Got: {}",
                expected,
                report.recomputed_root
            ));
        }
    }

    if verbose {
        println!("\nBundle Summary:");
        println!("  Artifact: {}", bundle.artifact_id);
        println!("  Versions: {} -> {}", bundle.from_version_id, bundle.to_version_id);
        println!("  Risk tier: {}", bundle.risk_tier);
        println!("  Chain length: {}", report.chain_length);
        println!("  Root hash: {}", report.recomputed_root);
        println!("  Retention expires: {}", bundle.retention.expires_at);
    }

    Ok(())
}
