fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generated messages carry no doc comments.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .type_attribute(".", "#[allow(missing_docs)]")
        .compile(&["proto/plot.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/plot.proto");
    Ok(())
}
