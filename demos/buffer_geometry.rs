use gralloc_rs::geometry::{FORMATS, VenusNv12, plane_offsets};
use gralloc_rs::padding::AdrenoUtils;
use gralloc_rs::{GeometryCalculator, PaddingAdvisor, SurfacePadding};
use std::env;
use std::sync::Arc;

fn main() {
    let args: Vec<String> = env::args().collect();
    let width = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1920);
    let height = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1080);

    println!("============================================================");
    println!("           Buffer Geometry for {width}x{height}");
    println!("============================================================");

    let padding = AdrenoUtils::load().map(|lib| Arc::new(lib) as Arc<dyn SurfacePadding>);
    let advisor = PaddingAdvisor::new(padding).with_video_layout(Arc::new(VenusNv12));
    println!(
        "[+] Adreno padding routine: {}",
        if advisor.has_padding_routine() { "loaded" } else { "not found (32-pixel alignment)" }
    );
    let calc = GeometryCalculator::new(advisor);

    println!(
        "\n{:<20} {:>8} {:>8} {:>12}  {}",
        "Format", "Stride", "Lines", "Size", "Planes"
    );
    println!("------------------------------------------------------------");

    for info in &FORMATS {
        let h = if info.format == gralloc_rs::PixelFormat::Blob { 1 } else { height };
        match calc.compute_geometry(width, h, info.format) {
            Ok(g) => {
                let planes = match plane_offsets(info.format, g.aligned_width, g.aligned_height) {
                    Ok(p) => format!(
                        "cb@{} cr@{} cstride {} step {}",
                        p.cb, p.cr, p.c_stride, p.chroma_step
                    ),
                    Err(_) => "-".to_string(),
                };
                println!(
                    "{:<20} {:>8} {:>8} {:>12}  {}",
                    format!("{:?}", info.format),
                    g.aligned_width,
                    g.aligned_height,
                    g.size,
                    planes
                );
            }
            Err(e) => println!("{:<20} {e}", format!("{:?}", info.format)),
        }
    }
}
