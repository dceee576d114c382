/// Story Linter: checks story documents for structural problems.
///
/// Usage: story_linter <story_file_or_dir> [--strict]
///
/// Reads every `.json` and `.ron` story under the path, prints its
/// validation warnings and Distinct Ending Count, and exits non-zero if
/// any document fails to decode (or, with `--strict`, has warnings).

use std::path::{Path, PathBuf};
use std::process;

use story_graph::core::paths::count_distinct_endings;
use story_graph::core::validate::validate_story;
use story_graph::schema::story::{Story, StoryError};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("story_graph=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: story_linter <story_file_or_dir> [--strict]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let mut strict = false;
    for arg in &args[2..] {
        match arg.as_str() {
            "--strict" => strict = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
    }

    let mut files = Vec::new();
    if target.is_file() {
        files.push(target.to_path_buf());
    } else if target.is_dir() {
        collect_story_files(target, &mut files);
        files.sort();
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    }

    println!("Found {} story documents", files.len());
    println!("\n=== Story Lint Report ===");

    let mut failures = 0;
    let mut warned = 0;
    let mut warning_total = 0;

    for path in &files {
        println!("\n{}", path.display());
        let story = match load_story(path) {
            Ok(story) => story,
            Err(e) => {
                println!("  ERROR: {}", e);
                failures += 1;
                continue;
            }
        };

        println!(
            "  '{}' ({}): {} segments, {} distinct endings",
            story.metadata.title,
            story.id,
            story.segments.len(),
            count_distinct_endings(&story)
        );

        let warnings = validate_story(&story);
        if warnings.is_empty() {
            println!("  All checks passed!");
        } else {
            warned += 1;
            warning_total += warnings.len();
        }
        for warning in &warnings {
            println!("  WARNING: {}", warning);
        }
    }

    println!(
        "\nSummary: {} documents, {} unreadable, {} warnings across {} stories",
        files.len(),
        failures,
        warning_total,
        warned
    );

    if failures > 0 || (strict && warned > 0) {
        process::exit(1);
    }
}

fn load_story(path: &Path) -> Result<Story, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let decoded: Result<Story, StoryError> = match path.extension().and_then(|s| s.to_str()) {
        Some("ron") => Story::parse_ron(&contents),
        _ => Story::from_json(&contents),
    };
    decoded.map_err(|e| e.to_string())
}

fn collect_story_files(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_story_files(&path, files);
            } else if is_story_document(&path) {
                files.push(path);
            }
        }
    }
}

fn is_story_document(path: &Path) -> bool {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => true,
        // Engine configs may sit alongside stories.
        Some("ron") => !path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem == "config" || stem.ends_with("_config")),
        _ => false,
    }
}
