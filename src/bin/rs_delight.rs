//! Demo host shell: an animated scene with a sphere sprite and two
//! warm cone lights, one spinning, rendered frame by frame to PNG
//! files. Window creation and event polling stay out of the
//! renderer; writing frames to disk is the presentation here.

// std
use std::path::{Path, PathBuf};
// command line options
use clap::Parser;
// pbrt
use rs_delight::core::compositor::{Compositor, Sprite};
use rs_delight::core::delight::{Float, Spectrum};
use rs_delight::core::error::Error;
use rs_delight::core::geometry::{Normal2f, Point2f, Point2i};
use rs_delight::core::texture::Texture;
use rs_delight::lights::point::PointLight;
use rs_delight::lights::LightAccumulator;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render the animated demo scene to numbered PNG frames.
#[derive(Parser)]
#[command(version = VERSION)]
struct Cli {
    /// use specified number of threads for the light pass
    #[arg(short = 't', long = "nthreads", default_value = "0")]
    nthreads: u8,
    /// number of frames to render
    #[arg(short = 'n', long = "frames", default_value = "60")]
    frames: u32,
    /// width of the low-resolution buffers
    #[arg(long = "width", default_value = "480")]
    width: i32,
    /// height of the low-resolution buffers
    #[arg(long = "height", default_value = "270")]
    height: i32,
    /// integer upscale factor for presentation
    #[arg(long = "pixel-size", default_value = "3")]
    pixel_size: u32,
    /// directory the frames are written to
    #[arg(short = 'o', long = "outdir", default_value = "frames")]
    outdir: PathBuf,
    /// additionally dump the color, normal and lit buffers per frame
    #[arg(long = "dump-buffers")]
    dump_buffers: bool,
}

/// Build a sphere sprite pair: a flat disc for the color buffer and
/// the matching sphere normal map. The normal's x/y components are
/// the texel's offset from the disc center, which is exactly the
/// visible part of a unit sphere's surface normal.
fn sphere_sprites(size: i32) -> (Texture, Texture) {
    let resolution: Point2i = Point2i { x: size, y: size };
    let mut color: Texture = Texture::new(resolution);
    let mut normal: Texture = Texture::new(resolution);
    let r: Float = size as Float / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx: Float = (x as Float + 0.5 - r) / r;
            let dy: Float = (y as Float + 0.5 - r) / r;
            if dx * dx + dy * dy <= 1.0 {
                let p: Point2i = Point2i { x, y };
                color.set_texel(p, [0.8, 0.8, 0.85, 1.0]);
                normal.set_normal(p, &Normal2f { x: dx, y: dy }, 1.0);
            }
        }
    }
    (color, normal)
}

fn render_frame(
    compositor: &mut Compositor,
    sprites: &[Sprite],
    lights: &LightAccumulator,
    frame_path: &Path,
    dump_buffers: bool,
    outdir: &Path,
) -> Result<(), Error> {
    compositor.rasterize(sprites)?;
    let film = compositor.illuminate(lights)?;
    let presented = compositor.present(&film);
    presented.save(frame_path).map_err(Error::ImageWrite)?;
    if dump_buffers {
        compositor.color_target().write_image(&outdir.join("color.png"))?;
        compositor.normal_target().write_image(&outdir.join("normal.png"))?;
        film.write_image(&outdir.join("lit.png"))?;
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let resolution: Point2i = Point2i {
        x: cli.width,
        y: cli.height,
    };
    let mut compositor: Compositor = match Compositor::new(resolution, cli.pixel_size) {
        Ok(compositor) => compositor
            .with_background(Spectrum::default())
            .with_num_threads(cli.nthreads),
        Err(e) => {
            log::error!("Cannot start renderer: {}", e);
            std::process::exit(1);
        }
    };
    let presented: Point2i = compositor.presented_resolution();
    println!("screen size of {} x {}", presented.x, presented.y);
    std::fs::create_dir_all(&cli.outdir).expect("Failed to create output directory");

    let mut lights: LightAccumulator = LightAccumulator::new();
    lights
        .set_global_light(Spectrum::rgb(1.0, 0.9, 0.8), 0.1)
        .expect("Failed to set global light");
    lights
        .add_point_light(
            PointLight::new(Point2f { x: 140.0, y: 130.0 }, 150.0)
                .with_color(Spectrum::rgb(1.0, 0.75, 0.5))
                .with_intensity(2.0)
                .with_volumetric_intensity(0.3)
                .with_direction(0.0)
                .with_angular_width(0.6),
        )
        .expect("Failed to add point light");
    let spinning = lights
        .add_point_light(
            PointLight::new(Point2f { x: 140.0, y: 130.0 }, 150.0)
                .with_color(Spectrum::rgb(1.0, 0.75, 0.5))
                .with_intensity(2.0)
                .with_volumetric_intensity(0.3)
                .with_direction(std::f32::consts::PI)
                .with_angular_width(0.6),
        )
        .expect("Failed to add point light");

    let (sphere_color, sphere_normal) = sphere_sprites(30);
    let sprites = [Sprite {
        color: &sphere_color,
        normal: &sphere_normal,
        position: Point2i { x: 180, y: 100 },
    }];

    for frame in pbr::PbIter::new(0..cli.frames) {
        if let Some(light) = lights.light_mut(spinning) {
            light.direction += 0.01;
        }
        let frame_path = cli.outdir.join(format!("frame_{:04}.png", frame));
        if let Err(e) = render_frame(
            &mut compositor,
            &sprites,
            &lights,
            &frame_path,
            cli.dump_buffers,
            &cli.outdir,
        ) {
            // a failed frame is skipped, the loop carries on with
            // fresh inputs
            log::error!("Skipping frame {}: {}", frame, e);
        }
    }
}
