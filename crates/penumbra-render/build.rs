fn main() {
    // Shaders are pulled in with include_str!
    println!("cargo:rerun-if-changed=shaders/");
    println!("cargo:rerun-if-changed=shaders/fullscreen.wgsl");
    println!("cargo:rerun-if-changed=shaders/paint.wgsl");
    println!("cargo:rerun-if-changed=shaders/seed.wgsl");
    println!("cargo:rerun-if-changed=shaders/jump_flood.wgsl");
    println!("cargo:rerun-if-changed=shaders/distance.wgsl");
    println!("cargo:rerun-if-changed=shaders/cascade.wgsl");
    println!("cargo:rerun-if-changed=shaders/cursor.wgsl");
}
