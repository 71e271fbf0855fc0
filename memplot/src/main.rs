use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use plotting::{Chart, RenderErrors, save_png, show};
use samples::{SampleErrors, SeriesSet, load};
use thiserror::Error;

#[derive(Debug, Error)]
enum MemplotErrors {
    #[error("{0}")]
    Sample(#[from] SampleErrors),
    #[error("{0}")]
    Render(#[from] RenderErrors),
}

/// One line on the chart: the sample file it is read from and its legend
/// label.
struct SampleSource {
    file: &'static str,
    label: &'static str,
}

// The four map implementations covered by the memory benchmark, in chart
// order.
const SOURCES: [SampleSource; 4] = [
    SampleSource {
        file: "LongLongHashMapMemory",
        label: "LongLongMap",
    },
    SampleSource {
        file: "HashMapMemory",
        label: "HashMap",
    },
    SampleSource {
        file: "HashtableMemory",
        label: "Hashtable",
    },
    SampleSource {
        file: "TreeMapMemory",
        label: "TreeMap",
    },
];

/// Plots the memory-consumption curves of the benchmarked map
/// implementations on a shared chart.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory containing the memory sample files
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Write the chart to this PNG instead of opening a window
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn load_sources(dir: &Path, sources: &[SampleSource]) -> Result<SeriesSet, SampleErrors> {
    let mut set = SeriesSet::new();
    for source in sources {
        set.insert(load(dir.join(source.file))?);
    }
    Ok(set)
}

fn run(cli: Cli) -> Result<(), MemplotErrors> {
    let dir = cli
        .dir
        .unwrap_or_else(|| PathBuf::from("."));
    let set = load_sources(&dir, &SOURCES)?;
    let labels: Vec<&str> = SOURCES
        .iter()
        .map(|source| source.label)
        .collect();

    let chart = Chart::new()
        .with_caption("Map Memory Consumption")
        .with_x_desc("Entries")
        .with_y_desc("Memory per entry / 16 B");
    let buffer = chart.render(&set, &labels)?;

    match cli.out {
        Some(path) => {
            save_png(&path, &buffer, chart.width(), chart.height())?;
            println!("chart written to {}", path.display());
            Ok(())
        }
        None => show(chart.caption(), buffer, chart.width(), chart.height()),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_sources_table() {
        assert_eq!(SOURCES.len(), 4);
        assert_eq!(SOURCES[0].file, "LongLongHashMapMemory");
        let labels: Vec<&str> = SOURCES
            .iter()
            .map(|source| source.label)
            .collect();
        assert_eq!(labels, ["LongLongMap", "HashMap", "Hashtable", "TreeMap"]);
    }

    #[test]
    fn test_load_sources_and_render() {
        let dir = std::env::temp_dir().join("memplot_e2e");
        fs::create_dir_all(&dir).unwrap();
        for source in &SOURCES {
            fs::write(dir.join(source.file), "1 2.5\n2 3.75\n").unwrap();
        }

        let set = load_sources(&dir, &SOURCES).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(set.len(), 4);
        for series in set.iter() {
            assert_eq!(series.len(), 2);
            assert_eq!(series.x, vec![1, 2]);
        }

        let labels: Vec<&str> = SOURCES
            .iter()
            .map(|source| source.label)
            .collect();
        let chart = Chart::new().with_size(320, 240);
        let buffer = chart
            .render(&set, &labels)
            .unwrap();
        assert_eq!(buffer.len(), 320 * 240 * 3);
    }

    #[test]
    fn test_load_sources_fails_fast() {
        let dir = std::env::temp_dir().join("memplot_missing");
        fs::create_dir_all(&dir).unwrap();
        let result = load_sources(&dir, &SOURCES);
        fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(result, Err(SampleErrors::FileAccess { .. })));
    }
}
