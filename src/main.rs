mod display;

use std::{path::Path, process};

use anyhow::Context;
use log::{error, info};
use mandelbrot_image::{
    colour::{self, Rendering},
    config::Config,
    export, grid,
};

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        error!("{err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("reading configuration")?;
    let viewport = config.viewport()?;
    let budget = config.budget()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    let rendering = pool.install(|| {
        let grid = grid::generate_parallel(&viewport, budget);
        colour::render(&grid, config.transform, config.colour_map)
    });

    if let Some(path) = &config.output {
        save(&rendering, path)?;
    }

    if config.display {
        let extent = viewport.plane_extent();
        info!("plane extent {} to {}", extent.z1, extent.z2);
        display::show(&rendering, &format!("mandelbrot {} .. {}", extent.z1, extent.z2))
            .context("opening display window")?;
    }

    Ok(())
}

fn save(rendering: &Rendering, path: &Path) -> anyhow::Result<()> {
    export::save_png(rendering, path).with_context(|| format!("writing {}", path.display()))
}
