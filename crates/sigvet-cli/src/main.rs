use std::path::PathBuf;

use clap::Parser;

use sigvet_core::{verify, VerifyConfig, VerifyRequest};

mod exit_codes;

#[derive(Parser)]
#[command(
    name = "sigvet",
    version,
    about = "Trust verdicts for downloaded artifacts, backed by gpgv"
)]
struct Cli {
    /// Detached signature or clearsigned file
    signature: PathBuf,

    /// File whose content the signature covers
    content: PathBuf,

    /// Restrict trust to one key: a hex fingerprint, or an absolute
    /// keyring path
    #[arg(long)]
    signed_by: Option<String>,

    /// Path to the gpgv binary
    #[arg(long, env = "SIGVET_GPGV")]
    gpgv: Option<PathBuf>,

    /// Emit the verdict as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::INTERNAL_ERROR
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = VerifyConfig::default();
    if let Some(gpgv) = cli.gpgv {
        config.gpgv_path = gpgv;
    }
    let request = VerifyRequest {
        signature: cli.signature,
        content: cli.content,
        signed_by: cli.signed_by,
    };

    let verdict = verify(&config, &request)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        for warning in &verdict.warnings {
            eprintln!("W: {warning}");
        }
        if verdict.accepted {
            for line in &verdict.output {
                println!("{line}");
            }
        } else {
            eprintln!("E: {}", verdict.message);
        }
    }

    Ok(if verdict.accepted {
        exit_codes::SUCCESS
    } else {
        exit_codes::VERIFICATION_FAILED
    })
}
