use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use crate::WorldArgs;

pub fn run(args: &WorldArgs, name: &str) -> Result<(), String> {
    let world = super::load(args)?;

    let id = world
        .node_id(name)
        .ok_or_else(|| format!("node not found: \"{name}\""))?;
    let Some(node) = world.node(id) else {
        return Err(format!("node not found: \"{name}\""));
    };

    println!("  {} [hour {}]", node.name().bold(), world.clock().hour_of_day());
    println!();
    for line in node.description().lines() {
        println!("  {}", line.trim());
    }
    println!();

    if !node.adjacents().is_empty() {
        println!("  {}", "exits".dimmed());
        for (direction, target) in node.adjacents() {
            let target = world.node(*target).map_or("?", |n| n.name());
            println!("    {direction:<10} {target}");
        }
        println!();
    }

    let visible = world.get_active_characters(id);
    if visible.is_empty() {
        println!("  Nobody is here.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Description"]);
    for character in &visible {
        let desc = if character.description.is_empty() {
            "—"
        } else {
            character.description.as_str()
        };
        table.add_row(vec![character.name.as_str(), desc]);
    }
    println!("{table}");

    Ok(())
}
