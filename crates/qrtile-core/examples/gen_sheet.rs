//! Generates a sample QR code and tiles it on an A4 sheet
//!
//! Usage: cargo run -p qrtile-core --example gen_sheet -- [COUNT]

use std::path::Path;

use image::{GrayImage, Luma};
use qrcode::QrCode;
use qrtile_core::{LayoutRequest, RenderOptions, SheetConfig, SheetGenerator};

fn main() {
    env_logger::init();

    let count: u32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(20);

    let output_dir = Path::new("generated_sheets");
    std::fs::create_dir_all(output_dir).unwrap();

    let qr = QrCode::new("https://github.com/your-org/qrtile").unwrap();

    // Manual render to avoid Image crate version mismatch (qrcode uses old image)
    let module_size = 10u32;
    let quiet_zone = 4u32;
    let width = qr.width() as u32;
    let side = (width + quiet_zone * 2) * module_size;
    let mut img = GrayImage::from_pixel(side, side, Luma([255]));

    for y in 0..width {
        for x in 0..width {
            if qr[(x as usize, y as usize)] == qrcode::Color::Dark {
                let px = (quiet_zone + x) * module_size;
                let py = (quiet_zone + y) * module_size;
                for dy in 0..module_size {
                    for dx in 0..module_size {
                        img.put_pixel(px + dx, py + dy, Luma([0]));
                    }
                }
            }
        }
    }

    let image_path = output_dir.join("sample_qr.png");
    img.save(&image_path).unwrap();

    let generator = SheetGenerator::new(SheetConfig {
        render: RenderOptions {
            ruler: true,
            ..RenderOptions::default()
        },
        output_dir: output_dir.to_path_buf(),
        ..SheetConfig::default()
    });

    match generator.generate(&image_path, &LayoutRequest::with_count(count)) {
        Ok(output) => println!(
            "Created {:?}: {} codes, {:.1} mm each",
            output.path, output.count, output.tile_size
        ),
        Err(e) => eprintln!("Failed: {e}"),
    }
}
