/// Walkthrough example: reads every ending of a small fable.
///
/// Builds a story in code, validates it, then replays each distinct ending
/// in turn and prints the reader's progress and the shaded story map.
///
/// Run with: cargo run --example walkthrough

use story_graph::core::engine::StoryEngine;
use story_graph::core::validate::validate_story;
use story_graph::schema::story::{Choice, Segment, Story, StoryMetadata};

fn choice(id: &str, text: &str, next: &str, authentic: bool) -> Choice {
    Choice {
        id: id.to_string(),
        text: text.to_string(),
        next_segment_id: next.to_string(),
        is_authentic_path: authentic,
    }
}

fn segment(id: &str, text: &str, authentic: bool, choices: Vec<Choice>) -> Segment {
    Segment {
        id: id.to_string(),
        text: text.to_string(),
        audio_file_name: None,
        image_file_name: None,
        is_authentic_path: authentic,
        choices,
    }
}

fn fable() -> Story {
    Story {
        id: "tortoise-and-hare".to_string(),
        metadata: StoryMetadata {
            title: "The Tortoise and the Hare".to_string(),
            author: "Aesop (adapted)".to_string(),
            cultural_origin: Some("Greek".to_string()),
            synopsis: "A boastful hare races a patient tortoise.".to_string(),
            estimated_reading_minutes: 4,
            age_range: "4-8".to_string(),
            tags: vec!["fable".to_string(), "animals".to_string()],
            ..StoryMetadata::default()
        },
        segments: vec![
            segment(
                "start",
                "The hare laughs at the tortoise and challenges him to a race.",
                true,
                vec![
                    choice("accept", "The tortoise accepts", "race", true),
                    choice("decline", "The tortoise walks away", "declined", false),
                ],
            ),
            segment(
                "race",
                "The hare dashes ahead and soon cannot see the tortoise at all.",
                true,
                vec![
                    choice("nap", "The hare lies down for a nap", "nap", true),
                    choice("run", "The hare keeps running", "hare-wins", false),
                ],
            ),
            segment(
                "nap",
                "The sun is warm. The hare sleeps on.",
                true,
                vec![
                    choice("sleep", "Keep sleeping", "tortoise-wins", true),
                    choice("wake", "Wake with a start", "photo-finish", false),
                ],
            ),
            segment(
                "declined",
                "The hare has nobody to race and grows bored.",
                false,
                vec![],
            ),
            segment("hare-wins", "The hare wins, but nobody cheers.", false, vec![]),
            segment(
                "tortoise-wins",
                "Slow and steady, the tortoise crosses the line first.",
                true,
                vec![],
            ),
            segment(
                "photo-finish",
                "They cross the line together and share a laugh.",
                false,
                vec![],
            ),
        ],
    }
}

fn main() {
    let story = fable();
    let warnings = validate_story(&story);
    println!("=== {} ===", story.metadata.title);
    println!("{} validation warnings", warnings.len());

    let engine = StoryEngine::builder()
        .story(story)
        .build()
        .expect("Failed to build engine");
    println!("{} distinct endings\n", engine.ending_count());

    let mut record = engine.start();
    for ending in engine.endings() {
        println!("--- Route {} ---", ending.signature);
        for &index in &ending.signature.0 {
            let landed = engine
                .choose(&mut record, index)
                .expect("Ending route should be walkable");
            println!("  > {}", landed.text);
        }
        println!(
            "  {} of {} endings discovered ({:.0}%)\n",
            record.endings_discovered(),
            engine.ending_count(),
            record.completion * 100.0
        );
        engine.restart(&mut record).expect("Record belongs to this story");
    }

    println!("=== Story Map ===");
    let map = engine.map(Some(&record));
    for node in &map.nodes {
        let kind = if node.is_start {
            "start"
        } else if node.is_ending {
            "ending"
        } else {
            "scene"
        };
        println!(
            "{}{} [{}] depth={} position={}",
            "  ".repeat(node.depth),
            node.segment_id,
            kind,
            node.depth,
            node.position
        );
    }
    println!("\n{} edges drawn", map.drawable_edges().len());
}
