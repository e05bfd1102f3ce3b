extern crate clap;
extern crate env_logger;
extern crate log;
extern crate roam;

use clap::{App, Arg, ArgMatches};
use log::{info, warn};

use roam::extra::parser::load_heightfield;
use roam::heightfield::Heightfield;
use roam::math::{point3, Point3};
use roam::tessellation::{
    DistanceClamp, LodOptions, PatchOptions, TerrainPatch, TriangleBuffers,
};

use std::process;
use std::str::FromStr;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let matches = App::new("Roam command-line interface")
        .version("0.1")
        .about("Adaptive terrain tessellator")
        .arg(
            Arg::with_name("INPUT")
                .help("Heightmap file to tessellate")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("LEVELS")
                .short("l")
                .long("levels")
                .help("Maximum number of subdivision levels")
                .value_name("LEVELS")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ERROR_MARGIN")
                .short("e")
                .long("error-margin")
                .help("Allowed screen-space error before a triangle splits")
                .value_name("MARGIN")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("VIEW")
                .short("v")
                .long("view")
                .help("Viewpoint in the unit patch domain, e.g. 0.5,0.5 or 0.5,0.5,0.1")
                .value_name("X,Y[,Z]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("POOL_SIZE")
                .long("pool-size")
                .help("Capacity of the triangle pool, in nodes")
                .value_name("NODES")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("NEAR_CLAMP")
                .long("near-clamp")
                .help("Amplify the error of nearby triangles instead of attenuating distant ones"),
        )
        .arg(
            Arg::with_name("COUNT")
                .short("c")
                .long("count")
                .help("Prints the number of triangles and vertices"),
        )
        .arg(
            Arg::with_name("HISTOGRAM")
                .long("histogram")
                .help("Prints the distribution of the normalized heights"),
        )
        .arg(
            Arg::with_name("MESH")
                .long("mesh")
                .help("Dumps the emitted triangles to stdout"),
        )
        .get_matches();

    let filename = matches.value_of("INPUT").unwrap();
    let mut field = match load_heightfield(filename) {
        Ok(field) => field,
        Err(e) => {
            eprintln!("{}: {}", filename, e);
            process::exit(1);
        }
    };
    info!(
        "loaded {}: {}x{} heights in [{}, {}]",
        filename,
        field.width(),
        field.height(),
        field.min(),
        field.max()
    );

    if matches.is_present("HISTOGRAM") {
        print_histogram(&field);
    }

    field.compute_normals();

    let levels = parse_arg(&matches, "LEVELS", TerrainPatch::DEFAULT_TESSELLATION_LEVELS);
    let error_margin = parse_arg(&matches, "ERROR_MARGIN", LodOptions::DEFAULT_ERROR_MARGIN);
    let pool_capacity = parse_arg(&matches, "POOL_SIZE", PatchOptions::DEFAULT_POOL_CAPACITY);
    let view = parse_view(&matches);

    let mut lod = LodOptions::error_margin(error_margin);
    if matches.is_present("NEAR_CLAMP") {
        lod = lod.with_distance_clamp(DistanceClamp::Near);
    }

    let options = PatchOptions::DEFAULT.with_pool_capacity(pool_capacity);
    let mut patch = TerrainPatch::new(Arc::new(field), &options);
    patch.compute_variance(levels);

    patch.reset();
    patch.tessellate(view, &lod);

    if patch.pool_exhausted() {
        warn!("triangle pool exhausted; the mesh is coarser than requested");
    }

    println!("TerrainPatch {{");
    println!("  view: ({}, {}, {})", view.x, view.y, view.z);
    println!("  error_margin: {}", error_margin);
    println!("  pool: {} / {} nodes", patch.pool_used(), patch.pool_capacity());
    println!("  leaves: {}", patch.leaf_count());
    println!("}}");

    if matches.is_present("COUNT") {
        println!(
            " -- {} triangles, {} vertices",
            patch.leaf_count(),
            patch.leaf_count() * 3
        );
    }

    if matches.is_present("MESH") {
        let mut buffers = TriangleBuffers::with_capacity(patch.leaf_count());
        patch.emit(&mut buffers);
        print_mesh(&buffers);
    }
}

fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> T {
    match matches.value_of(name) {
        None => default,
        Some(src) => match src.parse() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("Invalid value for {}: {}", name, src);
                process::exit(1);
            }
        },
    }
}

fn parse_view(matches: &ArgMatches) -> Point3 {
    let src = match matches.value_of("VIEW") {
        None => return point3(0.5, 0.5, 0.0),
        Some(src) => src,
    };

    let components: Vec<f32> = src
        .split(',')
        .map(|part| match part.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("Invalid viewpoint: {}", src);
                process::exit(1);
            }
        })
        .collect();

    match components.as_slice() {
        [x, y] => point3(*x, *y, 0.0),
        [x, y, z] => point3(*x, *y, *z),
        _ => {
            eprintln!("Invalid viewpoint: {}", src);
            process::exit(1);
        }
    }
}

fn print_histogram(field: &Heightfield) {
    let mut buckets = [0usize; 11];
    for y in 0..field.height() {
        for x in 0..field.width() {
            let z = field.sample(x, y);
            let bucket = if (0.0..=1.0).contains(&z) {
                ((z * 10.0) as usize).min(9)
            } else {
                10
            };
            buckets[bucket] += 1;
        }
    }

    println!("histogram {{");
    for (i, count) in buckets.iter().take(10).enumerate() {
        println!(
            "  {:.1} - {:.1} : {}",
            i as f32 / 10.0,
            (i + 1) as f32 / 10.0,
            count
        );
    }
    println!("  else      : {}", buckets[10]);
    println!("}}");
}

fn print_mesh(buffers: &TriangleBuffers) {
    for triangle in buffers.positions.chunks(9) {
        println!(
            "triangle ({}, {}, {}) ({}, {}, {}) ({}, {}, {})",
            triangle[0],
            triangle[1],
            triangle[2],
            triangle[3],
            triangle[4],
            triangle[5],
            triangle[6],
            triangle[7],
            triangle[8],
        );
    }
}
