use hog_detect::objdetect::{HOGDescriptor, LinearModel};
use hog_detect::prelude::*;

fn main() -> Result<()> {
    println!("=== HOG Detection Demo ===\n");

    println!("1. Building the classic 64x128 detector geometry");
    let mut hog = HOGDescriptor::new()?;
    println!(
        "   descriptor length: {} (7 blocks wide * 15 blocks tall * 4 cells * 9 bins)\n",
        hog.descriptor_length()
    );

    println!("2. Installing an all-zero demo model (bias below zero so nothing fires)");
    let model = LinearModel::new(vec![0.0; hog.descriptor_length()], 5.0)?;
    hog.set_model(model)?;
    println!("   model installed\n");

    println!("3. Running detection over a synthetic flat-gray scene");
    let scene = Mat::new_with_default(256, 192, 1, MatDepth::U8, Scalar::all(128.0))?;
    let raw = hog.detect(&scene, -1000.0)?;
    println!("   {} raw window evaluations scored\n", raw.len());

    println!("4. Running detect_multi_scale (detect + mean-shift NMS)");
    let detections = hog.detect_multi_scale(&scene, -1000.0)?;
    println!("   {} final detections after mode-finding NMS", detections.len());
    for (i, d) in detections.iter().enumerate().take(5) {
        let (x0, y0, x1, y1) = d.bounds();
        println!(
            "     [{i}] center=({:.1}, {:.1}) scale={:.2} density={:.3} bounds=({:.0},{:.0})-({:.0},{:.0})",
            d.cx, d.cy, d.scale, d.density, x0, y0, x1, y1
        );
    }

    println!("\nA real detector would call HOGDescriptor::load_model with a trained");
    println!("linear SVM model file and run detect_multi_scale over natural images.");

    Ok(())
}
