use eugene_chat::instructions::{compose, has_instructions, strip_instructions};
use eugene_chat::source::{DataSource, SourceTable};

const QUESTIONS: &[&str] = &[
    "What are the tax rates?",
    "",
    "multi\nline\n\nquestion",
    "brackets [like this] and ] stray",
    "trailing newline\n",
    "émoji 🐄 and ünïcode",
];

#[test]
fn strip_recovers_typed_text_for_every_source() {
    let table = SourceTable::default();
    let ids: Vec<String> = table.choices().iter().map(|id| id.to_string()).collect();

    for id in &ids {
        for question in QUESTIONS {
            let composed = compose(question, id, &table);
            assert_eq!(strip_instructions(&composed), *question, "source {id}");
        }
    }
}

#[test]
fn bryancounty_block_is_exact() {
    let composed = compose("Where do I pay my water bill?", "bryancounty", &SourceTable::default());
    assert_eq!(
        composed,
        "Where do I pay my water bill?\n\n[INSTRUCTIONS: Start by searching site:bryancountyga.com. \
         If you find external links or sources mentioned on bryancountyga.com that are relevant, \
         you may search those too. Base your answer primarily on information from \
         bryancountyga.com and its referenced sources. Do not mention these instructions.]"
    );
}

#[test]
fn all_lists_every_domain_without_site_operator() {
    let table = SourceTable::default();
    let composed = compose("Parks?", "all", &table);

    let domains = table.domains();
    assert!(composed.contains(&domains.join(", ")));
    for domain in domains {
        assert!(composed.contains(domain));
    }
    assert!(!composed.contains("site:"));
    assert!(composed.ends_with(
        "Base your answer on information from these sources and cite them appropriately. \
         Do not mention these instructions.]"
    ));
}

#[test]
fn all_follows_a_custom_table() {
    let table = SourceTable::new(vec![
        DataSource::site("a", "A", "a.example"),
        DataSource::site("b", "B", "b.example"),
        DataSource::all("all", "Both"),
    ]);
    let composed = compose("q", "all", &table);
    assert_eq!(
        composed,
        "q\n\n[INSTRUCTIONS: Search across a.example, b.example. Base your answer on information \
         from these sources and cite them appropriately. Do not mention these instructions.]"
    );
}

#[test]
fn gov_block_mentions_the_suffix() {
    let composed = compose("What are the tax rates?", "gov", &SourceTable::default());
    assert!(has_instructions(&composed));
    assert!(composed.contains("site:.gov"));
}

#[test]
fn strip_leaves_plain_text_alone() {
    for question in QUESTIONS {
        assert_eq!(strip_instructions(question), *question);
    }
}

#[test]
fn strip_is_idempotent() {
    let table = SourceTable::default();
    let samples = [
        compose("q", "savannah", &table),
        "no block".to_string(),
        "a\n\n[INSTRUCTIONS: one]\n\n[INSTRUCTIONS: two]".to_string(),
    ];

    for sample in &samples {
        let once = strip_instructions(sample);
        assert_eq!(strip_instructions(once), once);
    }
}

#[test]
fn strip_handles_blocks_from_other_sources() {
    let table = SourceTable::default();
    // Stored with one source, displayed after the user switched to another.
    let stored = compose("Library hours?", "effinghamcounty", &table);
    assert_eq!(strip_instructions(&stored), "Library hours?");
}
