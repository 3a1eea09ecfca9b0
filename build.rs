use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let spv_dir = out_dir.join("spv");

    if let Err(e) = std::fs::create_dir(&spv_dir) {
        if e.kind() != ErrorKind::AlreadyExists {
            panic!("{e}")
        }
    }

    let mut compiled = Vec::new();

    for file in std::fs::read_dir("shaders").unwrap() {
        let file = file.unwrap();
        let path = file.path();

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if extension != "vert" && extension != "frag" {
            continue;
        }

        // phong.vert -> phong_vert.spv
        let stem = path.file_stem().unwrap().to_str().unwrap();
        let final_name = format!("{stem}_{extension}.spv");
        let output = spv_dir.join(&final_name);

        let status = std::process::Command::new("glslc").arg(&path).arg("-o").arg(&output).status();

        match status {
            Ok(s) if s.success() => {
                compiled.push((final_name, output));
            }
            Ok(s) => panic!("glslc failed on {}: {s}", path.display()),
            Err(e) => {
                println!("cargo:warning=glslc unavailable ({e}), {} not compiled", path.display());
            }
        }
    }

    pack_archive(&out_dir.join("shaders.zip"), Path::new("shaders/manifest.toml"), &compiled);

    println!("cargo:rerun-if-changed=shaders");
}

fn pack_archive(target: &Path, manifest: &Path, modules: &[(String, PathBuf)]) {
    let file = std::fs::File::create(target).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("manifest.toml", options).unwrap();
    zip.write_all(&std::fs::read(manifest).unwrap()).unwrap();

    for (name, path) in modules {
        zip.start_file(name.as_str(), options).unwrap();
        zip.write_all(&std::fs::read(path).unwrap()).unwrap();
    }

    zip.finish().unwrap();
}
