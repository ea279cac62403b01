use anyhow::{bail, Result};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        bail!("usage: terratrend <mask.tif> <data.tif> <output.tif>");
    }

    terratrend::process(&args[1], &args[2], &args[3])?;
    Ok(())
}
