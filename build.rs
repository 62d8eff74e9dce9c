use std::env;
use std::fs;
use std::path::Path;

// Generates the bundled-asset table embedded by `workspace`. Everything found
// under assets/jars and assets/tools at build time becomes a BundledAsset
// entry; the tree may be empty (payloads are vendored by release tooling).
fn main() {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let assets_root = Path::new(&manifest_dir).join("assets");

    let mut files = Vec::new();
    for group in ["jars", "tools"] {
        let group_dir = assets_root.join(group);
        if group_dir.is_dir() {
            collect_files(&group_dir, &assets_root, &mut files);
        }
    }
    files.sort();

    let mut table = String::from("pub static BUNDLED_ASSETS: &[BundledAsset] = &[\n");
    for rel in &files {
        let abs = assets_root.join(rel);
        table.push_str(&format!(
            "    BundledAsset {{ rel_path: {:?}, contents: include_bytes!({:?}) }},\n",
            rel.replace('\\', "/"),
            abs.display().to_string(),
        ));
    }
    table.push_str("];\n");

    fs::write(Path::new(&out_dir).join("bundled_assets.rs"), table)
        .expect("failed to write bundled asset table");
}

fn collect_files(dir: &Path, root: &Path, out: &mut Vec<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, root, out);
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel_to_string(rel));
        }
    }
}

fn rel_to_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
