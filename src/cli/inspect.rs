//! CLI `inspect` command: show everything stored for one user.

use anyhow::Result;
use concord::config::ConcordConfig;
use concord::memory::context::{self, NO_SUMMARY};
use concord::memory::entities;

/// Resolve `user_id` and print its context window and entities.
pub fn inspect(config: &ConcordConfig, user_id: &str) -> Result<()> {
    let memory = super::open_memory(config)?;
    let store = memory.store();

    let canonical = memory.resolve(user_id)?;
    println!("User: {user_id}");
    if canonical != user_id {
        println!("  Canonical id:   {canonical}");
    }
    println!("{}", "=".repeat(50));

    match context::load_window(store, &canonical)? {
        None => println!("Context window: (none)"),
        Some(window) => {
            println!(
                "  Summary:        {}",
                window.summary.as_deref().filter(|s| !s.is_empty()).unwrap_or(NO_SUMMARY)
            );
            if let Some(ref at) = window.updated_at {
                println!("  Updated:        {at}");
            }
            println!("  Messages:       {}", window.messages.len());

            let mut interfaces: Vec<&str> =
                window.messages.iter().map(|m| m.interface.as_str()).collect();
            interfaces.sort_unstable();
            interfaces.dedup();
            println!("  Interfaces:     {}", interfaces.join(", "));

            println!();
            for m in &window.messages {
                let preview: String = m.content.chars().take(80).collect();
                println!("  {} [{}] {}: {}", m.timestamp, m.interface, m.role, preview);
            }
        }
    }

    let all = entities::list_all(store, &canonical)?;
    println!();
    println!("Entities: {}", all.len());
    for e in &all {
        println!("  {} ({}): {} observation(s)", e.name, e.entity_type, e.observations.len());
        for o in &e.observations {
            println!("     [{}] {}", o.learned_from_interface, o.content);
        }
    }

    Ok(())
}
