//! Directory packer

use anyhow::{Context, Result, bail};
use flashpack::Compression;
use flashpack_format::{ImageBuilder, compress};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counters reported after packing
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PackStats {
    pub dirs: usize,
    pub files: usize,
    pub compressed: usize,
    pub input_bytes: u64,
    pub stored_bytes: u64,
}

/// Pack `input` and write the image to `output`.
pub fn run(input: &Path, output: &Path, mode: Compression, out: &mut impl Write) -> Result<()> {
    let (image, stats) = pack_dir(input, mode)?;
    std::fs::write(output, &image)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!("wrote {} ({} bytes)", output.display(), image.len());
    writeln!(
        out,
        "{}: {} directories, {} files ({} compressed), {} -> {} bytes, image {} bytes",
        output.display(),
        stats.dirs,
        stats.files,
        stats.compressed,
        stats.input_bytes,
        stats.stored_bytes,
        image.len()
    )?;
    Ok(())
}

/// Build an image from every directory and regular file under `input`.
///
/// Siblings are added in file name order. With a codec other than
/// [`Compression::None`] each file is encoded and the encoding kept only when
/// it is smaller than the original.
pub fn pack_dir(input: &Path, mode: Compression) -> Result<(Vec<u8>, PackStats)> {
    if !input.is_dir() {
        bail!("{} is not a directory", input.display());
    }

    let mut builder = ImageBuilder::new();
    let mut stats = PackStats::default();

    for entry in WalkDir::new(input).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", input.display()))?;
        let path = image_path(input, entry.path())?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            builder.add_dir(&path)?;
            stats.dirs += 1;
        } else if file_type.is_file() {
            let data = std::fs::read(entry.path())
                .with_context(|| format!("failed to read {}", entry.path().display()))?;
            stats.files += 1;
            stats.input_bytes += data.len() as u64;
            let (stored, compressed) = add_file(&mut builder, &path, data, mode)?;
            stats.stored_bytes += stored;
            stats.compressed += usize::from(compressed);
        } else {
            warn!("skipping {}: not a regular file", entry.path().display());
        }
    }

    let image = builder.build()?;
    Ok((image, stats))
}

fn add_file(
    builder: &mut ImageBuilder,
    path: &str,
    data: Vec<u8>,
    mode: Compression,
) -> Result<(u64, bool)> {
    if mode != Compression::None {
        let encoded = compress(&data, mode)?;
        if encoded.len() < data.len() {
            let real_size = u32::try_from(data.len())
                .with_context(|| format!("{path} is too large for an image"))?;
            debug!("{path}: {} -> {} bytes ({mode})", data.len(), encoded.len());
            let stored = encoded.len() as u64;
            builder.add_stored_file(path, mode.tag(), encoded, real_size)?;
            return Ok((stored, true));
        }
    }

    let stored = data.len() as u64;
    builder.add_file(path, data)?;
    Ok((stored, false))
}

/// Root-relative image path of `path`, separated with `/`
fn image_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root)?;
    let mut segments = Vec::new();
    for component in relative.components() {
        let segment = component
            .as_os_str()
            .to_str()
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        segments.push(segment);
    }
    Ok(segments.join("/"))
}
