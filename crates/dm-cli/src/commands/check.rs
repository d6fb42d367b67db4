use crate::WorldArgs;

pub fn run(args: &WorldArgs) -> Result<(), String> {
    let report = super::load_report(args)?;
    if report.has_errors() {
        return Err(format!(
            "{} source unit{} failed to load",
            report.error_count(),
            if report.error_count() == 1 { "" } else { "s" }
        ));
    }

    let world = &report.world;
    println!("  All checks passed for '{}'.", args.dir.display());
    println!(
        "  {} nodes, {} characters, {} quests",
        world.node_count(),
        world.character_count(),
        world.quest_count()
    );

    Ok(())
}
