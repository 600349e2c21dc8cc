// main.rs — sigs-verify entry point
//
// Parses the command line, sets up logging, optionally wraps the run in a
// pull-request checkout, and turns the session outcome into an exit code:
// 0 only when naming, signatures and content all pass.

mod cli;
mod git;
mod gpg;
mod pull;
mod sigs;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use sigs::error::VerifyError;
use sigs::session::Outcome;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("[sigs] error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = cli.run_config();
    let keyring = gpg::Gpg::new(cli.gpg.clone());
    let session = || sigs::session::run(&config, &keyring);

    let outcome = match cli.pull_id {
        Some(ref id) => {
            let pr = pull::PullRequest {
                id: id.clone(),
                remote: cli.remote.clone(),
                target_branch: cli.target_branch.clone(),
                merge: cli.merge,
            };
            let scm = git::Git::new(cli.git.clone(), &config.sigs_dir);
            let verify = if cli.no_verify { None } else { Some(session) };
            pull::with_pull_request(&scm, &pr, verify)?
        }
        None if cli.no_verify => None,
        None => Some(session()),
    };

    match outcome {
        Some(result) => report(result, cli.json),
        None => {
            eprintln!("[sigs] Verification skipped (--no-verify)");
            Ok(0)
        }
    }
}

fn report(result: Result<Outcome, VerifyError>, json: bool) -> Result<i32> {
    match result {
        Ok(Outcome::Verified(report)) => {
            for group in &report.groups {
                eprintln!(
                    "[sigs] {}: {} signer(s) agree ({})",
                    group.release,
                    group.members.len(),
                    group
                        .members
                        .iter()
                        .map(|m| m.signer.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            eprintln!();
            eprintln!(
                "✅ VERIFIED — {} assert file(s), {} signature(s)",
                report.attestations, report.signatures_verified
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(0)
        }
        Ok(Outcome::NothingToVerify) => {
            eprintln!("[sigs] Nothing to verify: no assert files found");
            Ok(0)
        }
        Err(e) => {
            let kind = e.kind();
            eprintln!();
            if let VerifyError::BadSignatures(ref failures) = e {
                eprint!("{}", sigs::signatures::render_failures(failures));
            }
            eprintln!("❌ UNVERIFIED — {} failure: {}", kind, e);
            Ok(kind.exit_code())
        }
    }
}
