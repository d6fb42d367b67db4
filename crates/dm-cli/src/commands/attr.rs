use crate::WorldArgs;

pub fn run(args: &WorldArgs, name: &str) -> Result<(), String> {
    let world = super::load(args)?;
    let value = world
        .get_world_attr(name)
        .ok_or_else(|| format!("unknown attribute: \"{name}\""))?;
    println!("{value}");
    Ok(())
}
