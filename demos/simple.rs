use bpmn_revisions::{Version, VersionManager, validate};

extern crate pretty_env_logger;

static ORDER: &str = include_str!("../tests/files/order.bpmn");
static ORDER_ARCHIVE: &str = include_str!("../tests/files/order_archive.bpmn");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    // Inspect a document without storing it
    let outcome = validate(ORDER_ARCHIVE);
    println!("Validation: {outcome}");

    let manager = VersionManager::in_memory();
    for (text, author, comment) in [
        (ORDER, "alice", "Initial version"),
        (ORDER_ARCHIVE, "bob", "Archive orders on request"),
        (ORDER, "carol", "Archive step removed"),
    ] {
        let revision = manager.create_version("order", text, author, comment)?;
        println!("Stored {revision} by {}", revision.author());
    }

    let comparison =
        manager.compare_revisions("order", &Version::new(1, 1, 0), &Version::new(2, 0, 0))?;
    println!("1.1.0 -> 2.0.0: {} ({})", comparison.summary, comparison.classification);

    // Roll back to the first revision
    manager.activate("order", &Version::INITIAL)?;
    if let Some(current) = manager.current("order")? {
        println!("Current version: {}", current.version());
    }

    println!("History:");
    for entry in manager.history("order")? {
        println!("  {} {}", entry.timestamp().format("%H:%M:%S"), entry);
    }
    Ok(())
}
