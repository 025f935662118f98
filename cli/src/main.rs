use log::{debug, error, info};
use overlay_core::mock::MockRenderer;
use overlay_core::{
    Corner, CornerLayouter, GridLayouter, ManagerDirectory, OverlayConfig, OverlayManager,
    OverlayRef, Position, RendererRef, Size, TextOverlay, GRID_IDENTIFIER,
};
use std::error::Error;
use std::sync::Arc;

mod cli;
mod logger;

/// Overlays of the simulated scene, kept typed so their state can be printed.
struct Scene {
    frame_counter: Arc<TextOverlay>,
    tiles: Vec<Arc<TextOverlay>>,
    label: Arc<TextOverlay>,
}

fn main() {
    let args = cli::parse_args();

    if let Err(e) = logger::init_logger(args.quiet, args.verbose) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &cli::Args) -> Result<(), Box<dyn Error>> {
    let config = if args.use_defaults {
        info!("Using default configuration");
        OverlayConfig::default()
    } else {
        OverlayConfig::load(args.config_path.as_deref(), !args.dry_run)?
    };

    if let Some(path) = &config.config_path {
        info!("Loaded configuration from {}", path.display());
    }

    if args.dry_run {
        info!("Configuration is valid");
        return Ok(());
    }

    let directory = ManagerDirectory::new(config.into_ref());
    let manager = directory.default_instance();
    info!(
        "Running {} frames on {} renderers with manager '{}'",
        args.frames,
        args.renderers,
        manager.id().unwrap_or_default()
    );

    let renderers: Vec<RendererRef> = (0..args.renderers)
        .map(|i| {
            MockRenderer::new(&format!("view-{i}"), Size::new(args.width, args.height))
                as RendererRef
        })
        .collect();

    let scene = build_scene(&directory, &manager, &renderers, args.tiles)?;

    for frame in 0..args.frames {
        scene.frame_counter.set_text(&format!("frame {}", frame + 1));
        for renderer in &renderers {
            manager.update_overlays(renderer);
        }
        debug!("Frame {} done", frame + 1);
    }

    for renderer in &renderers {
        print_placements(renderer, &scene);
    }

    directory.clear();
    Ok(())
}

fn build_scene(
    directory: &ManagerDirectory,
    manager: &OverlayManager,
    renderers: &[RendererRef],
    tiles: u32,
) -> Result<Scene, Box<dyn Error>> {
    let layout = &directory.config().layout;

    let frame_counter = TextOverlay::new("frame 0", layout);
    let label = TextOverlay::with_anchor(
        "unplaced label",
        Position::new(layout.margin as i32, layout.margin as i32),
        layout,
    );
    let tiles: Vec<_> = (0..tiles)
        .map(|i| TextOverlay::new(&format!("tile {}", i + 1), layout))
        .collect();

    let counter_ref: OverlayRef = frame_counter.clone();
    manager.add_overlay(&(label.clone() as OverlayRef));

    for renderer in renderers {
        manager.add_base_renderer(renderer);
        manager.add_layouter(GridLayouter::new(renderer, layout))?;
        for corner in Corner::ALL {
            manager.add_layouter(CornerLayouter::new(renderer, corner, layout))?;
        }

        manager.set_layouter(&counter_ref, Corner::BottomRight.identifier(), renderer)?;
        for tile in &tiles {
            manager.set_layouter(&(tile.clone() as OverlayRef), GRID_IDENTIFIER, renderer)?;
        }
    }

    Ok(Scene {
        frame_counter,
        tiles,
        label,
    })
}

fn print_placements(renderer: &RendererRef, scene: &Scene) {
    let viewport = renderer.viewport();
    println!(
        "{} ({}x{})",
        renderer.name(),
        viewport.width,
        viewport.height
    );

    let overlays = std::iter::once(&scene.frame_counter)
        .chain(scene.tiles.iter())
        .chain(std::iter::once(&scene.label));

    for overlay in overlays {
        match overlay.state(renderer) {
            Some(state) => {
                let bounds = state.display_bounds.unwrap_or_default();
                println!(
                    "  {:<16} x={:<5} y={:<5} w={:<5} h={:<5} {}",
                    format!("\"{}\"", state.text),
                    bounds.position.x,
                    bounds.position.y,
                    bounds.size.width,
                    bounds.size.height,
                    if state.visible { "visible" } else { "hidden" }
                );
            }
            None => println!("  {:<16} not updated", format!("\"{}\"", overlay.text())),
        }
    }
}
