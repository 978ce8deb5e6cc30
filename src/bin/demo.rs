// Thin wiring around the analytic test scene, for manual inspection of a
// render instead of as an API example. Writes a PPM rather than pulling in
// a PNG encoder just for this.

use lumen_rt::integrator::path_tracer_mis::PathTracerMis;
use lumen_rt::testutil::cornell_like_scene;
use lumen_rt::viewport::Viewport;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 400;
const PASSES: u32 = 32;

fn main() {
    let (scene, camera) = cornell_like_scene();

    let mut viewport = Viewport::new(WIDTH, HEIGHT).expect("viewport construction");
    viewport.set_renderer(Box::new(PathTracerMis::default()));

    let now = Instant::now();
    for pass in 0..PASSES {
        viewport.render(&scene, &camera).expect("render pass");
        if pass % 8 == 0 {
            println!("pass {pass} done, {:?} elapsed", now.elapsed());
        }
    }
    println!("render time: {:?}", now.elapsed());

    write_ppm("demo.ppm", WIDTH, HEIGHT, viewport.front_buffer()).expect("write demo.ppm");
}

fn write_ppm(path: &str, width: u32, height: u32, bgra: &[[u8; 4]]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P6\n{width} {height}\n255\n")?;
    for px in bgra {
        out.write_all(&[px[2], px[1], px[0]])?;
    }
    Ok(())
}
