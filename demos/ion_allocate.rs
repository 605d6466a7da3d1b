use gralloc_rs::{AllocController, AllocRequest, PixelFormat, PlatformConfig, UsageFlags};

fn main() {
    println!("============================================================");
    println!("                 ION Buffer Allocation Test                 ");
    println!("============================================================");

    println!("[+] Opening /dev/ion...");
    let controller = match AllocController::from_platform(PlatformConfig::default()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[-] Failed to create allocator: {e}");
            eprintln!("    (Ensure the ION driver is present and you have permissions)");
            std::process::exit(1);
        }
    };

    let requests = [
        ("UI layer", AllocRequest::new(1080, 1920, PixelFormat::Rgba8888, UsageFlags::new())),
        (
            "Camera preview",
            AllocRequest::new(1280, 720, PixelFormat::YCrCb420Sp, UsageFlags::new().camera_heap()),
        ),
        (
            "Video frame",
            AllocRequest::new(1920, 1080, PixelFormat::YCbCr420SpVenus, UsageFlags::new().iommu_heap()),
        ),
        ("JPEG blob", AllocRequest::new(1 << 20, 1, PixelFormat::Blob, UsageFlags::new())),
    ];

    for (name, req) in &requests {
        print!("[+] {name:<16} {}x{} {:?} ... ", req.width, req.height, req.format);
        match controller.allocate(req) {
            Ok(handle) => {
                println!(
                    "fd {} size {} stride {} flags 0x{:x}",
                    handle.fd,
                    handle.size,
                    handle.width,
                    handle.flags.bits()
                );
                if let Ok(planes) = handle.plane_layout() {
                    println!(
                        "    Y @ 0x{:x} (stride {}), Cb @ 0x{:x}, Cr @ 0x{:x}",
                        planes.y, planes.y_stride, planes.cb, planes.cr
                    );
                }
                controller.free(handle);
            }
            Err(e) => println!("failed: {e}"),
        }
    }
}
