use anyhow::Result;
use classgate::cli;

fn main() -> Result<()> {
    let action = cli::start()?;

    action.execute()?;

    Ok(())
}
