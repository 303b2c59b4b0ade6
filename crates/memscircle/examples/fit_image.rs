use memscircle::{CircleFinder, Configuration};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image.png> [config.json] [out.json]", args[0]);
        std::process::exit(2);
    }

    let image = image::open(&args[1])?;
    let config = match args.get(2) {
        Some(path) => Configuration::from_json_file(Path::new(path))?,
        None => Configuration::default(),
    };
    println!("{}", config);

    let finder = CircleFinder::with_config(config)?;
    let output = finder.find_dynamic(&image)?;
    println!(
        "Circle center=({:.3}, {:.3}) radius={:.3} from {} points, rms residual {:.3}px",
        output.circle.center[0],
        output.circle.center[1],
        output.circle.radius,
        output.stages.points.len(),
        output.rms_residual(),
    );

    if let Some(out_path) = args.get(3) {
        let json = serde_json::to_string_pretty(&output.circle)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
