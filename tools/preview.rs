/// Preview: interactive reading shell for trying out a story.
///
/// Usage: preview <story.json|story.ron> [--config <engine.ron>] [--progress <file.json>]
///
/// Commands:
///   look             show the current segment and its choices
///   choose <n>       take choice n (1-based)
///   restart          go back to the beginning, keeping discovered endings
///   status           show progress and completion
///   map              print the story map
///   endings          list every distinct ending and whether its segment was visited
///   bookmark [name]  save the current position
///   back <n>         restore bookmark n
///   help             list commands
///   quit             exit

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;

use story_graph::core::engine::{EngineConfig, StoryEngine};
use story_graph::core::map::StoryMap;
use story_graph::schema::bookmark::Bookmark;
use story_graph::schema::progress::ProgressRecord;
use story_graph::schema::story::Story;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("story_graph=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let story_path = args[1].clone();
    let mut config_path = None;
    let mut progress_path = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--progress" if i + 1 < args.len() => {
                i += 1;
                progress_path = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(ref path) => load_config(path),
        None => EngineConfig::default(),
    };
    let story = load_story(&story_path);

    let engine = match StoryEngine::builder().story(story).with_config(config).build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let mut record = match progress_path {
        Some(ref path) => load_progress(path, &engine),
        None => engine.start(),
    };
    let mut bookmarks: Vec<Bookmark> = Vec::new();

    println!(
        "Loaded '{}' ({} segments, {} distinct endings)",
        engine.story().metadata.title,
        engine.story().segments.len(),
        engine.ending_count()
    );
    for warning in engine.warnings() {
        println!("WARNING: {}", warning);
    }
    println!("Type 'help' for commands.\n");
    print_segment(&engine, &record);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "look" | "l" => {
                print_segment(&engine, &record);
            }
            "choose" | "c" => {
                let index = match parts.get(1).and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) if n > 0 => n - 1,
                    _ => {
                        println!("Usage: choose <n>  (n starts at 1)");
                        continue;
                    }
                };
                match engine.choose(&mut record, index) {
                    Ok(_) => {
                        save_progress(progress_path.as_deref(), &record);
                        print_segment(&engine, &record);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "restart" => match engine.restart(&mut record) {
                Ok(()) => {
                    save_progress(progress_path.as_deref(), &record);
                    println!("Back to the beginning.\n");
                    print_segment(&engine, &record);
                }
                Err(e) => println!("ERROR: {}", e),
            },
            "status" | "s" => {
                print_status(&engine, &record);
            }
            "map" | "m" => {
                print_map(&engine.map(Some(&record)), &record.current_segment_id);
            }
            "endings" => {
                print_endings(&engine, &record);
            }
            "bookmark" | "b" => {
                let name = if parts.len() > 1 {
                    Some(parts[1..].join(" "))
                } else {
                    None
                };
                match engine.bookmark(&record, name) {
                    Ok(mark) => {
                        println!(
                            "Bookmark {} saved at '{}'",
                            bookmarks.len() + 1,
                            mark.segment_id
                        );
                        bookmarks.push(mark);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "back" => {
                if parts.len() < 2 {
                    println!("Usage: back <n>");
                    for (n, mark) in bookmarks.iter().enumerate() {
                        println!(
                            "  {}. {} ({})",
                            n + 1,
                            mark.name.as_deref().unwrap_or("unnamed"),
                            mark.segment_id
                        );
                    }
                    continue;
                }
                let mark = match parts[1].parse::<usize>() {
                    Ok(n) if n > 0 && n <= bookmarks.len() => &bookmarks[n - 1],
                    _ => {
                        println!("No bookmark {}", parts[1]);
                        continue;
                    }
                };
                match engine.restore_bookmark(&mut record, mark) {
                    Ok(()) => {
                        save_progress(progress_path.as_deref(), &record);
                        print_segment(&engine, &record);
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
}

fn print_usage() {
    println!("Preview: interactive reading shell for trying out a story.");
    println!();
    println!("Usage: preview <story.json|story.ron> [--config <engine.ron>] [--progress <file.json>]");
    println!();
    println!("  --config <path>    Engine config in RON, e.g. (policy: Advisory)");
    println!("  --progress <path>  Progress file to resume from and save to");
}

fn print_help() {
    println!("Commands:");
    println!("  look             Show the current segment");
    println!("  choose <n>       Take choice n");
    println!("  restart          Start over, keeping discovered endings");
    println!("  status           Show progress");
    println!("  map              Print the story map");
    println!("  endings          List every distinct ending");
    println!("  bookmark [name]  Save the current position");
    println!("  back <n>         Return to bookmark n");
    println!("  help             Show this help");
    println!("  quit             Exit");
}

fn print_segment(engine: &StoryEngine, record: &ProgressRecord) {
    let segment = match engine.current_segment(record) {
        Ok(segment) => segment,
        Err(e) => {
            println!("ERROR: {}", e);
            return;
        }
    };

    let marker = if segment.is_authentic_path { " *" } else { "" };
    println!("--- {}{} ---", segment.id, marker);
    println!("{}", segment.text);
    if segment.is_ending() {
        println!("\n[The End] {}", completion_line(engine, record));
        println!("Type 'restart' to read again.");
    } else {
        println!();
        for (n, choice) in segment.choices.iter().enumerate() {
            let seen = if record.is_visited(&choice.next_segment_id) {
                " (visited)"
            } else {
                ""
            };
            println!("  {}. {}{}", n + 1, choice.text, seen);
        }
    }
    println!();
}

fn print_status(engine: &StoryEngine, record: &ProgressRecord) {
    println!("Story:    {}", record.story_id);
    println!("Position: {}", record.current_segment_id);
    println!("Path:     {}", record.history.join(" > "));
    println!(
        "Visited:  {} / {} segments",
        record.visited_segments.len(),
        engine.story().segments.len()
    );
    println!("Endings:  {}", completion_line(engine, record));
    println!("Last read {}", record.last_activity.format("%Y-%m-%d %H:%M UTC"));
}

fn completion_line(engine: &StoryEngine, record: &ProgressRecord) -> String {
    format!(
        "{} of {} endings discovered ({:.0}%)",
        record.endings_discovered(),
        engine.ending_count(),
        record.completion * 100.0
    )
}

fn print_endings(engine: &StoryEngine, record: &ProgressRecord) {
    let endings = engine.endings();
    println!("{} distinct endings:", endings.len());
    for ending in &endings {
        let seen = if record.is_visited(&ending.segment_id) {
            "visited"
        } else {
            "unseen"
        };
        println!("  {:<24} {} ({})", ending.signature.to_string(), ending.segment_id, seen);
    }
}

/// One row per depth, nodes placed at their horizontal slot.
fn print_map(map: &StoryMap, current: &str) {
    const CELL: usize = 14;
    for depth in 0..=map.max_depth() {
        let mut row = vec![' '; (map.max_position() + 1) * CELL];
        for node in map.nodes.iter().filter(|n| n.depth == depth) {
            let label = if node.segment_id == current {
                format!("[{}]", node.segment_id)
            } else if node.explored {
                node.segment_id.clone()
            } else {
                "?".to_string()
            };
            for (offset, ch) in label.chars().take(CELL - 1).enumerate() {
                if let Some(slot) = row.get_mut(node.position * CELL + offset) {
                    *slot = ch;
                }
            }
        }
        let line: String = row.into_iter().collect();
        println!("{:>2} {}", depth, line.trim_end());
    }
}

fn load_story(path: &str) -> Story {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("ERROR reading story {}: {}", path, e);
            process::exit(1);
        }
    };
    let decoded = match Path::new(path).extension().and_then(|s| s.to_str()) {
        Some("ron") => Story::parse_ron(&contents),
        _ => Story::from_json(&contents),
    };
    match decoded {
        Ok(story) => story,
        Err(e) => {
            eprintln!("ERROR loading story {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn load_config(path: &str) -> EngineConfig {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|contents| EngineConfig::parse_ron(&contents).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR loading config {}: {}", path, e);
            process::exit(1);
        }
    }
}

/// Resume from `path` if it holds a record for this story, otherwise start
/// fresh.
fn load_progress(path: &str, engine: &StoryEngine) -> ProgressRecord {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return engine.start(),
    };
    let resumed = serde_json::from_str::<ProgressRecord>(&contents)
        .map_err(|e| e.to_string())
        .and_then(|record| engine.resume(record).map_err(|e| e.to_string()));
    match resumed {
        Ok(record) => {
            println!("Resumed progress from {}", path);
            record
        }
        Err(e) => {
            eprintln!("Ignoring progress file {}: {}", path, e);
            engine.start()
        }
    }
}

fn save_progress(path: Option<&str>, record: &ProgressRecord) {
    let Some(path) = path else {
        return;
    };
    let written = serde_json::to_string_pretty(record)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
    if let Err(e) = written {
        eprintln!("ERROR saving progress to {}: {}", path, e);
    }
}
