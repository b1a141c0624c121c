/// Demo entry point
/// Builds a synthetic scene (a large wall occluder in front of a field of
/// cubes) and runs the culling pipeline for a number of frames, printing
/// per-stage timings and cull rates.
use glam::{Mat4, Vec3};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::time::Instant;

use occlusion_engine::*;

fn build_scene() -> Vec<SceneObject> {
    let mut objects = Vec::new();

    // A wall close to the camera, nominated as an occluder.
    objects.push(SceneObject::with_mesh(
        0,
        MeshData::quad(30.0, 20.0),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),
        true,
    ));

    // A field of cubes behind the wall.
    let mut index = 1;
    for x in -10..=10 {
        for y in -4..=4 {
            for layer in 0..4 {
                let position = Vec3::new(
                    x as f32 * 3.0,
                    y as f32 * 3.0,
                    -30.0 - layer as f32 * 15.0,
                );
                objects.push(SceneObject::with_mesh(
                    index,
                    MeshData::cube(1.0),
                    Mat4::from_translation(position),
                    false,
                ));
                index += 1;
            }
        }
    }

    objects
}

fn main() {
    env_logger::init();

    println!("=== Software Occlusion Culling Demo ===");
    println!();

    let config = CullingConfig::default();
    println!(
        "Coverage grid: {}x{} ({} bands)",
        config.buffer_width,
        config.buffer_height,
        config.band_count()
    );
    println!("Worker threads: {}", rayon::current_num_threads());

    let mut pipeline = match OcclusionPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("pipeline configuration rejected: {err}");
            std::process::exit(1);
        }
    };

    let scene = build_scene();
    println!("Scene: {} objects", scene.len());

    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), 16.0 / 9.0);
    camera.look_at(Vec3::new(0.0, 0.0, -10.0), Vec3::Y);

    const FRAMES: usize = 100;
    let run_start = Instant::now();
    let mut total_culled = 0usize;
    let mut total_tested = 0usize;

    for frame in 0..FRAMES {
        perf_scope!("demo_frame");

        // Gentle orbit so frames are not all identical.
        camera.position.x = (frame as f32 * 0.02).sin() * 2.0;

        let results = match pipeline.execute(&camera, &scene) {
            Ok(results) => results,
            Err(err) => {
                eprintln!("frame {frame} failed: {err}");
                std::process::exit(1);
            }
        };

        total_culled += results.stats().occludees_culled;
        total_tested += results.len();

        if frame == 0 {
            let stats = *results.stats();
            println!();
            println!("Frame 0:");
            println!("  in frustum:     {}", stats.objects_in_frustum);
            println!("  occluders:      {}", stats.occluders);
            println!("  triangles:      {}", stats.triangles_rasterized);
            println!(
                "  culled:         {}/{}",
                stats.occludees_culled, stats.occludees
            );
        }
    }

    let elapsed = run_start.elapsed();
    println!();
    println!(
        "{} frames in {:.2}ms ({:.2}ms/frame)",
        FRAMES,
        elapsed.as_secs_f64() * 1e3,
        elapsed.as_secs_f64() * 1e3 / FRAMES as f64
    );
    println!(
        "Average cull rate: {:.1}%",
        total_culled as f64 / total_tested.max(1) as f64 * 100.0
    );

    pipeline.timings().print_summary();
}
