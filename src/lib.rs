pub mod block;
pub mod conditions;
pub mod convert;
pub mod tag;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    let total_stages = 2
        + usize::from(args.conditions.is_some())
        + usize::from(args.output.is_some());
    let progress = CliProgress::new("Convert", total_stages);
    let mut stage = 0usize;

    stage += 1;
    progress.emit(stage, "Resolving input path");
    let input = canonicalize_file(&args.input)?;

    stage += 1;
    progress.emit(stage, "Parsing blocks and emitting statements");
    let source = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read '{}'.", input.display()))?;
    let conversion = convert::convert_source(&source)?;
    let mut lines = conversion.lines;

    if let Some(conditions_path) = &args.conditions {
        stage += 1;
        progress.emit(stage, "Applying conditions");
        let conditions = conditions::load_conditions(conditions_path)?;
        lines = lines
            .iter()
            .map(|line| conditions::apply_conditions(line, &conditions))
            .collect();
    }

    if let Some(output) = &args.output {
        stage += 1;
        progress.emit(stage, "Writing output");
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(output, text.as_bytes())
            .with_context(|| format!("Failed to write '{}'.", output.display()))?;
    } else {
        for line in &lines {
            println!("{line}");
        }
    }

    eprintln!(
        "Converted {} blocks into {} lines.",
        conversion.blocks_emitted,
        lines.len()
    );
    Ok(())
}

pub fn convert_entry_to_java_lines(input: &Path) -> Result<Vec<String>> {
    let input = canonicalize_file(input)?;
    let source = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read '{}'.", input.display()))?;
    convert_source_to_java_lines(&source)
}

pub fn convert_source_to_java_lines(source: &str) -> Result<Vec<String>> {
    Ok(convert::convert_source(source)?.lines)
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!("Input file not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}
