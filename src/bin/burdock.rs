use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;

use thistle::{interpret, ThistleError};

/// Batch runner: interprets every `.lsp` file found under a directory.
/// Each file is an independent buffer with its own global frame; a failure
/// in one file is reported and never aborts the remaining files.
#[derive(Parser)]
#[command(author, version, about = "Batch runner for Thistle scripts")]
struct Args {
    /// Directory to search for *.lsp files
    #[arg(default_value = ".")]
    dir: PathBuf,
}

fn main() -> Result<(), ThistleError> {
    let args = Args::parse();
    let scripts = collect_lsp_files(&args.dir)?;
    if scripts.is_empty() {
        println!("No .lsp files found under {}.", args.dir.display());
        return Ok(());
    }

    let mut failures = 0;
    for script in &scripts {
        println!("{}", script.display());
        let source = match fs::read_to_string(script) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("failed to read `{}`: {err}", script.display());
                failures += 1;
                continue;
            }
        };
        if let Err(err) = interpret(&source) {
            eprintln!("{err}");
            failures += 1;
        }
    }

    println!(
        "Interpreted {} script(s), {failures} failure(s).",
        scripts.len()
    );
    Ok(())
}

fn collect_lsp_files(root: &Path) -> Result<Vec<PathBuf>, ThistleError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_lsp_files(&path)?);
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("lsp") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
