#![allow(dead_code)]

pub mod fake_kpt;

use std::path::Path;

/// Kptfile as written by `kpt pkg init`, plus a comment that any rewrite drops.
pub const PKG_ONLY_KPTFILE: &str = "# managed by hand\napiVersion: kpt.dev/v1\nkind: Kptfile\nmetadata:\n  name: app\n";

pub fn write_kptfile(dir: &Path, inventory: Option<(&str, &str, &str)>) {
    let mut content = PKG_ONLY_KPTFILE.to_string();
    if let Some((id, name, namespace)) = inventory {
        content.push_str(&format!(
            "inventory:\n  namespace: {namespace}\n  name: {name}\n  inventoryID: {id}\n"
        ));
    }
    std::fs::write(dir.join("Kptfile"), content).unwrap();
}

pub fn kptfile_untouched(dir: &Path) -> bool {
    std::fs::read_to_string(dir.join("Kptfile"))
        .unwrap()
        .starts_with("# managed by hand")
}
