use comfy_table::{ContentArrangement, Table};

use crate::WorldArgs;

pub fn run(args: &WorldArgs) -> Result<(), String> {
    let world = super::load(args)?;

    let statuses = world.quest_statuses();
    if statuses.is_empty() {
        println!("  No quests found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Quest", "Stage", "Details", "Next"]);
    for status in &statuses {
        let stage = status.value.map_or("—".to_string(), |v| v.to_string());
        let next = if status.transitions.is_empty() {
            "—".to_string()
        } else {
            status.transitions.join("\n")
        };
        table.add_row(vec![status.name.clone(), stage, status.details.clone(), next]);
    }

    println!("{table}");
    println!();
    println!("  {} quests", statuses.len());

    Ok(())
}
