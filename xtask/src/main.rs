use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

const WASM_TARGET: &str = "wasm32-unknown-unknown";

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for gridglow")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, deny, doc, wasm
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny check
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Build the browser overlay for wasm32
    Wasm {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
    },
    /// Render a PNG of the default grid through gridglow-cli
    Snapshot {
        #[arg(long, default_value = "target/gridglow.png")]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_deny()?;
            run_doc()?;
            run_wasm(false)?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Deny => run_deny()?,
        Commands::Doc => run_doc()?,
        Commands::Build => run_build()?,
        Commands::Wasm { release } => run_wasm(release)?,
        Commands::Snapshot { out } => run_snapshot(&out)?,
    }

    Ok(())
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("cargo fmt check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    // gridglow-web only links against wasm32; its host build is still linted
    cargo(
        "cargo clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn run_tests() -> Result<()> {
    cargo("cargo test", &["test", "--workspace"])
}

fn run_deny() -> Result<()> {
    cargo(
        "cargo deny check",
        &["deny", "check", "licenses", "bans", "sources"],
    )
}

fn run_doc() -> Result<()> {
    cargo("cargo doc", &["doc", "--workspace", "--no-deps"])
}

fn run_build() -> Result<()> {
    cargo("cargo build", &["build", "--workspace"])
}

fn run_wasm(release: bool) -> Result<()> {
    let mut args = vec!["build", "-p", "gridglow-web", "--target", WASM_TARGET];
    if release {
        args.push("--release");
    }
    cargo("wasm build", &args)
}

fn run_snapshot(out: &str) -> Result<()> {
    cargo(
        "snapshot",
        &[
            "run",
            "-p",
            "gridglow-cli",
            "--",
            "snapshot",
            "--out",
            out,
            "--backdrop",
            "#0b1020",
        ],
    )
}
