//! `spot` - render a scene description to a sequence of PNG frames.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use spot_core::{load_obj, Mesh, SceneDescription, SourceDesc, TextureCache};
use spot_math::Vec3;
use spot_renderer::{from_description, write_png, Camera, RenderConfig, Scene};

#[derive(Parser, Debug)]
#[command(name = "spot", version, about = "Whitted-style triangle ray tracer")]
struct Cli {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Directory the frames are written to
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Number of frames (overrides the scene)
    #[arg(long)]
    frames: Option<u32>,

    /// Image width in pixels (overrides the scene)
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels (overrides the scene)
    #[arg(long)]
    height: Option<u32>,

    /// Worker threads; rayon picks one per core when unset
    #[arg(long)]
    threads: Option<usize>,

    /// Seed for scatter sampling (overrides the scene)
    #[arg(long)]
    seed: Option<u64>,

    /// Render on a single thread
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

impl Cli {
    /// Fold command-line overrides into the scene description.
    fn apply_overrides(&self, desc: &mut SceneDescription) {
        if let Some(frames) = self.frames {
            desc.frames = frames;
        }
        if let Some(width) = self.width {
            desc.width = width;
        }
        if let Some(height) = self.height {
            desc.height = height;
        }
        if self.seed.is_some() {
            desc.seed = self.seed;
        }
    }

    fn render_config(&self, desc: &SceneDescription) -> RenderConfig {
        let defaults = RenderConfig::default();
        RenderConfig {
            max_depth: desc.max_depth.unwrap_or(defaults.max_depth),
            seed: desc.seed,
            parallel: !self.sequential,
        }
    }
}

fn output_path(out_dir: &Path, prefix: &str, frame: u32) -> PathBuf {
    out_dir.join(format!("{}{}.png", prefix, frame))
}

/// Load every mesh the scene references, once per distinct path.
fn load_meshes(desc: &SceneDescription) -> Result<Vec<Arc<Mesh>>> {
    let mut loaded: HashMap<PathBuf, Arc<Mesh>> = HashMap::new();
    let mut meshes = Vec::with_capacity(desc.objects.len());

    for (i, object) in desc.objects.iter().enumerate() {
        let mesh = match &object.source {
            SourceDesc::Mesh(path) => {
                let path = desc.resolve_path(path);
                match loaded.get(&path) {
                    Some(mesh) => Arc::clone(mesh),
                    None => {
                        let mesh = Arc::new(
                            load_obj(&path)
                                .with_context(|| format!("object {}: loading {}", i, path.display()))?,
                        );
                        loaded.insert(path, Arc::clone(&mesh));
                        mesh
                    }
                }
            }
            SourceDesc::Quad(corners) => Arc::new(Mesh::quad((*corners).map(Vec3::from_array))),
        };
        meshes.push(mesh);
    }

    Ok(meshes)
}

/// Render every frame of `desc` into `out_dir`. Returns the written paths.
fn render_frames(desc: &SceneDescription, config: &RenderConfig, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let meshes = load_meshes(desc)?;
    let mut textures = match &desc.base_dir {
        Some(dir) => TextureCache::with_base_dir(dir),
        None => TextureCache::new(),
    };
    let camera = Camera::new(desc.camera.origin(), desc.width, desc.height);
    let mut written = Vec::with_capacity(desc.frames as usize);

    for frame in 0..desc.frames {
        let start = Instant::now();
        let mut scene = Scene::new();

        for (i, (object, mesh)) in desc.objects.iter().zip(&meshes).enumerate() {
            let material = from_description(&object.material, &mut textures, frame)
                .with_context(|| format!("object {}: building material", i))?;
            scene.add_mesh(mesh, material, &object.transform_at(frame));
        }

        let image = scene.render(&camera, config);
        let path = output_path(out_dir, &desc.output_prefix, frame);
        write_png(&path, &image).with_context(|| format!("writing {}", path.display()))?;

        log::info!(
            "Frame {}/{}: {} triangles in {:.2?}",
            frame + 1,
            desc.frames,
            scene.len(),
            start.elapsed()
        );
        written.push(path);
    }

    Ok(written)
}

fn run(cli: &Cli) -> Result<()> {
    let mut desc = SceneDescription::load(&cli.scene)
        .with_context(|| format!("loading scene {}", cli.scene.display()))?;
    cli.apply_overrides(&mut desc);
    desc.validate().context("invalid scene after overrides")?;

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }

    let config = cli.render_config(&desc);
    log::info!(
        "Rendering {} frame(s) at {}x{} (max depth {}, {})",
        desc.frames,
        desc.width,
        desc.height,
        config.max_depth,
        if config.parallel { "parallel" } else { "sequential" }
    );

    let written = render_frames(&desc, &config, &cli.out_dir)?;
    log::info!("Wrote {} frame(s) to {}", written.len(), cli.out_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    run(&cli)
}
