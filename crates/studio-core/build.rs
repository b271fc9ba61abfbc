fn main() {
    // Recompile when the compile-time defaults change; option_env!() values
    // are otherwise cached.
    println!("cargo:rerun-if-env-changed=STUDIO_REST_URL");
    println!("cargo:rerun-if-env-changed=STUDIO_BACKEND_URL");
    println!("cargo:rerun-if-env-changed=STUDIO_API_KEY");
}
