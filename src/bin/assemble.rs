use mosaic_assembler::anchor::load_anchor_transform;
use mosaic_assembler::config::assemble;
use mosaic_assembler::features::HarrisPatchDetector;
use mosaic_assembler::image::io::{load_grayscale_dir, save_grayscale_u8, write_json_file};
use mosaic_assembler::types::AssemblyState;
use mosaic_assembler::MosaicAssembler;
use std::env;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let program = env::args().next().unwrap_or_else(|| "assemble".to_string());
    let config = assemble::parse_cli(&program)?;

    let mut pieces = load_grayscale_dir(&config.pieces_dir)?;
    if pieces.is_empty() {
        return Err(format!(
            "No decodable images in {}",
            config.pieces_dir.display()
        ));
    }

    // The anchor is the named piece, or the first in lexicographic order.
    let anchor_index = match &config.anchor_piece {
        Some(name) => pieces
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| format!("Anchor piece '{name}' not found in pieces directory"))?,
        None => 0,
    };
    let (anchor_name, anchor_image) = pieces.remove(anchor_index);

    let anchor_transform =
        load_anchor_transform(&config.anchor_transform).map_err(|e| e.to_string())?;

    let mut assembler = MosaicAssembler::new(
        config.params,
        Box::new(HarrisPatchDetector::default()),
        config.canvas_width,
        config.canvas_height,
    );
    assembler
        .seed_anchor(&anchor_image, &anchor_transform)
        .map_err(|e| e.to_string())?;
    println!("Anchor: {anchor_name}");

    for (name, image) in pieces {
        assembler.add_piece(name, image);
    }

    let report = assembler.run().map_err(|e| e.to_string())?;

    println!("Assembly summary");
    println!("  state: {:?}", report.state);
    println!("  rounds: {}", report.rounds);
    println!("  coverage: {:.3}", report.coverage);
    println!("  latency_ms: {:.3}", report.latency_ms);
    for p in &report.placements {
        println!(
            "  round {:>3}: piece {} ({}) inliers={} coverage={:.3}",
            p.round, p.piece_id, p.piece_name, p.inlier_count, p.coverage
        );
    }
    if report.state == AssemblyState::Stuck {
        println!("  unplaced:");
        for u in &report.unplaced {
            println!("    piece {} ({})", u.piece_id, u.piece_name);
        }
    }

    if let Some(path) = &config.report_json {
        write_json_file(path, &report)?;
        println!("Report written to {}", path.display());
    }

    save_grayscale_u8(assembler.canvas(), &config.output_path)?;
    println!("Mosaic written to {}", config.output_path.display());

    Ok(())
}
