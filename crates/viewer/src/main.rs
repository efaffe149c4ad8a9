//! Headless SPH viewer.
//!
//! Builds a scene, advances it at a fixed frame rate and alternates between
//! particle and surface output, logging what a renderer would receive.
//!
//! Run with:
//!   RUST_LOG=info cargo run -p viewer --release -- [sphere|cylinder|sphere-high-res|scene.json]
//!       [--frames N] [--toggle-every N] [--spin DEG_PER_SEC] [--save scene.json]

use std::error::Error;
use std::path::Path;

use glam::{Quat, Vec3};
use sph3d::{Container, FluidBody, Frame, RenderMode, SceneConfig};

const FRAME_TIME: f32 = 1.0 / 60.0;

struct Options {
    scene: String,
    frames: u32,
    toggle_every: u32,
    spin_deg_per_sec: f32,
    save: Option<String>,
}

impl Options {
    fn parse() -> Result<Self, Box<dyn Error>> {
        let mut options = Self {
            scene: "sphere".to_string(),
            frames: 240,
            toggle_every: 60,
            spin_deg_per_sec: 0.0,
            save: None,
        };

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| format!("{} expects a value", flag))
            };
            match arg.as_str() {
                "--frames" => options.frames = value("--frames")?.parse()?,
                "--toggle-every" => options.toggle_every = value("--toggle-every")?.parse()?,
                "--spin" => options.spin_deg_per_sec = value("--spin")?.parse()?,
                "--save" => options.save = Some(value("--save")?),
                other if other.starts_with("--") => {
                    return Err(format!("unknown flag {}", other).into())
                }
                other => options.scene = other.to_string(),
            }
        }
        Ok(options)
    }
}

fn load_scene(name: &str) -> Result<SceneConfig, Box<dyn Error>> {
    let scene = match name {
        "sphere" => SceneConfig::sphere(),
        "cylinder" => SceneConfig::cylinder(),
        "sphere-high-res" => SceneConfig::sphere_high_res(),
        path => SceneConfig::load_json(Path::new(path))?,
    };
    Ok(scene)
}

fn report_frame(body: &mut FluidBody, frame: u32) {
    let bounds = body.solver().container().bounding_box();
    match body.frame() {
        Frame::Particles(particles) => {
            let count = particles.len().max(1) as f32;
            let centroid = particles.iter().map(|p| p.position).sum::<Vec3>() / count;
            let mean_density = particles.iter().map(|p| p.density).sum::<f32>() / count;
            let escaped = particles.iter().filter(|p| !bounds.contains(p.position)).count();
            log::info!(
                "frame {:4}: {} particles, centroid {:.3?}, mean density {:.1}",
                frame,
                particles.len(),
                centroid,
                mean_density
            );
            if escaped > 0 {
                log::warn!("frame {:4}: {} particles outside the container bounds", frame, escaped);
            }
        }
        Frame::Surface(mesh) => {
            log::info!(
                "frame {:4}: surface with {} triangles ({} vertices)",
                frame,
                mesh.len(),
                mesh.vertex_count()
            );
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let options = Options::parse()?;
    let scene = load_scene(&options.scene)?;
    log::info!("Scene '{}': {}", scene.name, scene.description);

    if let Some(path) = &options.save {
        scene.save_json(Path::new(path))?;
        log::info!("Saved scene to {}", path);
    }

    let mut body = scene.build()?;
    log::info!(
        "{} particles, total fluid mass {:.2} kg",
        body.solver().particle_count(),
        body.solver().particles().total_mass()
    );
    let spin_per_frame = Quat::from_rotation_z(options.spin_deg_per_sec.to_radians() * FRAME_TIME);

    let mut unsettled_total = 0;
    for frame in 0..options.frames {
        if options.toggle_every > 0 && frame > 0 && frame % options.toggle_every == 0 {
            let mode = body.toggle_render_mode();
            log::info!("Render mode -> {:?}", mode);
        }
        if options.spin_deg_per_sec != 0.0 {
            let solver = body.solver_mut();
            let orientation = (spin_per_frame * solver.orientation()).normalize();
            solver.set_orientation(orientation);
        }

        let step = body.animate(FRAME_TIME);
        unsettled_total += step.unsettled;
        report_frame(&mut body, frame);
    }

    let solver = body.solver();
    log::info!(
        "Done after {} steps: max speed {:.3} m/s, {} unsettled collisions",
        solver.frame(),
        solver.particles().max_speed(),
        unsettled_total
    );
    if body.render_mode() == RenderMode::Particles {
        log::info!("Final surface: {} triangles", body.surface().len());
    }
    Ok(())
}
