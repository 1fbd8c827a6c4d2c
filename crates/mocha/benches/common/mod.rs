use std::{fs, path::PathBuf};

use mocha::{ChunkwiseAttention, Config, EfficientChunkwiseAttention, StableChunkwiseAttention};

/// Both backends, labelled for table rows.
pub fn backends() -> Vec<(&'static str, Box<dyn ChunkwiseAttention>)> {
    vec![
        (
            "efficient",
            Box::new(EfficientChunkwiseAttention::new()) as Box<dyn ChunkwiseAttention>,
        ),
        (
            "stable",
            Box::new(StableChunkwiseAttention::new()) as Box<dyn ChunkwiseAttention>,
        ),
    ]
}

pub fn bench_config() -> Config {
    Config::from_env()
}

pub fn format_markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let line = |cells: &[String]| format!("| {} |\n", cells.join(" | "));
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rule = vec!["---".to_string(); headers.len()];
    std::iter::once(line(&headers))
        .chain(std::iter::once(line(&rule)))
        .chain(rows.iter().map(|row| line(row)))
        .collect()
}

/// Write the latest table for `name` to `benchmarks/<name>.md`.
pub fn update_results(name: &str, table: &str) -> std::io::Result<PathBuf> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("benchmarks");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.md", name.to_lowercase()));
    fs::write(&path, format!("# {name}\n\n{table}"))?;
    Ok(path)
}
