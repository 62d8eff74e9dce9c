//! Read access to ZIP-family archives: the input application package and the
//! bundled tool jars (which are ZIP files themselves).

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extract one named member of `zip_path` into `dest_dir`, preserving the
/// member's relative path. Errors if the member is absent.
pub fn extract_member(zip_path: &Path, member: &str, dest_dir: &Path) -> Result<PathBuf> {
    let file = File::open(zip_path)
        .with_context(|| format!("opening archive '{}'", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("reading archive '{}'", zip_path.display()))?;

    let mut entry = archive
        .by_name(member)
        .with_context(|| format!("locating '{}' in '{}'", member, zip_path.display()))?;

    let dest = dest_dir.join(member);
    write_entry(&mut entry, &dest)
        .with_context(|| format!("extracting '{}' from '{}'", member, zip_path.display()))?;
    Ok(dest)
}

/// Extract every member of `zip_path` whose name matches `pattern` into
/// `dest_dir`, preserving relative paths and unix permission bits. Returns
/// the number of files written; zero means nothing matched.
pub fn extract_matching(zip_path: &Path, pattern: &str, dest_dir: &Path) -> Result<usize> {
    let file = File::open(zip_path)
        .with_context(|| format!("opening archive '{}'", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("reading archive '{}'", zip_path.display()))?;

    let mut extracted = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("reading entry {} of '{}'", index, zip_path.display()))?;
        if entry.is_dir() || !pattern_matches(pattern, entry.name()) {
            continue;
        }
        let Some(rel) = entry.enclosed_name() else {
            bail!("archive '{}' contains unsafe path '{}'", zip_path.display(), entry.name());
        };

        let dest = dest_dir.join(&rel);
        write_entry(&mut entry, &dest).with_context(|| {
            format!("extracting '{}' from '{}'", rel.display(), zip_path.display())
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            if mode & 0o111 != 0 {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dest, fs::Permissions::from_mode(mode & 0o777))
                    .with_context(|| format!("setting permissions on '{}'", dest.display()))?;
            }
        }

        extracted += 1;
    }
    Ok(extracted)
}

fn write_entry(entry: &mut impl io::Read, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    let mut out =
        File::create(dest).with_context(|| format!("creating '{}'", dest.display()))?;
    io::copy(entry, &mut out).with_context(|| format!("writing '{}'", dest.display()))?;
    Ok(())
}

/// Match an archive member name against a wildcard pattern. `*` matches any
/// run of characters (including `/`), `?` matches a single character, and
/// everything else matches literally. Total: no filesystem or environment
/// access.
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = name.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            // Backtrack: let the last `*` consume one more character.
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}
