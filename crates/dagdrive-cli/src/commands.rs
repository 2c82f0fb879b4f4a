use std::fs::File;
use std::io::{self, Read, Write};

use anyhow::Context;
use colored::Colorize;
use dagdrive_driver::{DagDriver, DriverConfig, FileInfo, StorageDriver};
use dagdrive_store::ContentStore;
use serde_json::json;
use tracing::debug;

use crate::cli::*;

/// Connect to the configured daemon and run one command against it.
pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let driver = DagDriver::from_config(&config)
        .with_context(|| format!("connecting to daemon at {}", config.addr))?;
    debug!(addr = %config.addr, root = driver.root(), "driver ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&driver, &config, cli.command, cli.format, &mut stdin.lock(), &mut out)?;
    out.flush()?;
    Ok(())
}

/// Config file first, then command-line overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<DriverConfig> {
    let mut config = match &cli.config {
        Some(path) => DriverConfig::from_file(path)?,
        None => DriverConfig::default(),
    };
    if let Some(addr) = &cli.addr {
        config.addr = addr.clone();
    }
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Run `command` against an already constructed driver, writing to `out`.
pub fn execute<S: ContentStore>(
    driver: &DagDriver<S>,
    config: &DriverConfig,
    command: Command,
    format: OutputFormat,
    input: &mut dyn Read,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Get(args) => {
            let content = driver.get_content(&args.path)?;
            out.write_all(&content)?;
        }
        Command::Cat(args) => {
            let mut reader = driver.reader(&args.path, args.offset)?;
            io::copy(&mut reader, out)?;
        }
        Command::Put(args) => {
            let mut content = Vec::new();
            open_input(args.file.as_deref(), input)?.read_to_end(&mut content)?;
            driver.put_content(&args.path, &content)?;
            match format {
                OutputFormat::Json => {
                    print_json(out, &json!({ "path": args.path, "bytes": content.len() }))?
                }
                OutputFormat::Text => writeln!(
                    out,
                    "{} Stored {} bytes at {}",
                    "✓".green().bold(),
                    content.len(),
                    args.path.bold()
                )?,
            }
        }
        Command::Append(args) => {
            let mut source = open_input(args.file.as_deref(), input)?;
            let kept = driver.write_stream(&args.path, args.offset, &mut source)?;
            match format {
                OutputFormat::Json => print_json(out, &json!({ "path": args.path, "kept": kept }))?,
                OutputFormat::Text => writeln!(
                    out,
                    "{} Appended to {} after {} kept bytes",
                    "✓".green().bold(),
                    args.path.bold(),
                    kept
                )?,
            }
        }
        Command::Stat(args) => {
            let info = driver.stat(&args.path)?;
            match format {
                OutputFormat::Json => print_json(out, &info)?,
                OutputFormat::Text => print_info(out, &info)?,
            }
        }
        Command::Ls(args) => {
            let mut children = driver.list(&args.path)?;
            children.sort();
            match format {
                OutputFormat::Json => print_json(out, &children)?,
                OutputFormat::Text => {
                    for child in &children {
                        writeln!(out, "{child}")?;
                    }
                }
            }
        }
        Command::Mv(args) => {
            driver.move_object(&args.source, &args.dest)?;
            match format {
                OutputFormat::Json => {
                    print_json(out, &json!({ "source": args.source, "dest": args.dest }))?
                }
                OutputFormat::Text => writeln!(
                    out,
                    "{} Moved {} → {}",
                    "✓".green().bold(),
                    args.source.bold(),
                    args.dest.bold()
                )?,
            }
        }
        Command::Rm(args) => {
            driver.delete(&args.path)?;
            match format {
                OutputFormat::Json => print_json(out, &json!({ "deleted": args.path }))?,
                OutputFormat::Text => {
                    writeln!(out, "{} Deleted {}", "✓".green().bold(), args.path.bold())?
                }
            }
        }
        Command::Info => match format {
            OutputFormat::Json => print_json(
                out,
                &json!({
                    "driver": driver.name(),
                    "addr": config.addr,
                    "configured_root": config.root,
                    "root": driver.root(),
                    "name": driver.published_name(),
                }),
            )?,
            OutputFormat::Text => {
                writeln!(out, "Driver: {}", driver.name().cyan())?;
                writeln!(out, "  Daemon: {}", config.addr.bold())?;
                writeln!(out, "  Root: {}", driver.root().yellow())?;
                writeln!(out, "  Publishes: {}", driver.published_name().green())?;
                if config.root != driver.root() {
                    writeln!(out, "  Configured as: {}", config.root.dimmed())?;
                }
            }
        },
    }
    Ok(())
}

fn open_input<'a>(
    file: Option<&std::path::Path>,
    stdin: &'a mut dyn Read,
) -> anyhow::Result<Box<dyn Read + 'a>> {
    match file {
        Some(path) => {
            let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            Ok(Box::new(f))
        }
        None => Ok(Box::new(stdin)),
    }
}

fn print_info(out: &mut dyn Write, info: &FileInfo) -> io::Result<()> {
    let kind = if info.is_dir { "directory".blue() } else { "file".green() };
    writeln!(out, "{}", info.path.bold())?;
    writeln!(out, "  Kind: {kind}")?;
    if !info.is_dir {
        writeln!(out, "  Size: {}", info.size)?;
    }
    writeln!(out, "  Modified: {}", "unknown".dimmed())
}

fn print_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
