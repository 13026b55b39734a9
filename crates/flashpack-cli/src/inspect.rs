//! Read-only image inspection: `info`, `ls`, `stat` and `cat`

use anyhow::{Context, Result};
use flashpack::{Backend, Compression, Entry, EntryKind, Filesystem, OpenFlags, Stat};
use serde::Serialize;
use std::io::Write;

/// `stat --json` output
#[derive(Debug, Serialize)]
struct StatReport<'a> {
    path: &'a str,
    #[serde(flatten)]
    stat: Stat,
    codec: String,
}

fn codec_name(tag: u8) -> String {
    Compression::from_tag(tag).map_or_else(|| format!("unknown({tag})"), |c| c.name().to_string())
}

pub fn info(fs: &Filesystem<'_>, out: &mut impl Write) -> Result<()> {
    let header = fs.header();
    let backends: Vec<&str> = Backend::compiled().iter().map(|b| b.name()).collect();

    writeln!(
        out,
        "version:    {}.{}",
        header.version_major, header.version_minor
    )?;
    writeln!(out, "entries:    {}", header.entry_count)?;
    writeln!(out, "image size: {} bytes", header.image_size)?;
    writeln!(out, "mapped:     {}", fs.is_mapped())?;
    writeln!(out, "backends:   {}", backends.join(", "))?;
    Ok(())
}

pub fn ls(fs: &Filesystem<'_>, path: &str, recursive: bool, out: &mut impl Write) -> Result<()> {
    let dir = fs
        .resolve(path)
        .with_context(|| format!("cannot list {path}"))?;
    list(fs, &dir, recursive, out)
}

fn list(fs: &Filesystem<'_>, dir: &Entry<'_>, recursive: bool, out: &mut impl Write) -> Result<()> {
    for child in fs.open_dir(Some(dir))? {
        let child = child?;
        let stat = child.stat();
        let (kind, codec) = match stat.kind {
            EntryKind::Directory => ('d', String::from("-")),
            EntryKind::File => ('-', codec_name(stat.compression)),
        };
        writeln!(
            out,
            "{kind} {:>10} {:>10} {:<8} {}",
            stat.size,
            stat.compressed_size,
            codec,
            fs.path_of(&child)?
        )?;
        if recursive && child.is_dir() {
            list(fs, &child, recursive, out)?;
        }
    }
    Ok(())
}

pub fn stat(fs: &Filesystem<'_>, path: &str, json: bool, out: &mut impl Write) -> Result<()> {
    let entry = fs.resolve(path).with_context(|| format!("cannot stat {path}"))?;
    let stat = entry.stat();
    let full_path = fs.path_of(&entry)?;
    let codec = codec_name(stat.compression);

    if json {
        let report = StatReport {
            path: &full_path,
            stat,
            codec,
        };
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "path:            /{full_path}")?;
    writeln!(out, "kind:            {}", stat.kind)?;
    if stat.kind == EntryKind::File {
        writeln!(out, "size:            {}", stat.size)?;
        writeln!(out, "compressed size: {}", stat.compressed_size)?;
        writeln!(out, "codec:           {codec}")?;
    } else {
        writeln!(out, "children:        {}", entry.child_count())?;
    }
    Ok(())
}

pub fn cat(fs: &Filesystem<'_>, path: &str, raw: bool, out: &mut impl Write) -> Result<()> {
    let flags = if raw { OpenFlags::RAW } else { OpenFlags::empty() };
    let mut file = fs
        .open_path(path, flags)
        .with_context(|| format!("cannot open {path}"))?;
    std::io::copy(&mut file, out)?;
    file.close();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use flashpack_format::ImageBuilder;
    use pretty_assertions::assert_eq;

    fn image() -> Vec<u8> {
        let mut builder = ImageBuilder::new();
        builder
            .add_file("index.html", vec![b'x'; 120])
            .expect("Operation should succeed");
        builder
            .add_compressed_file("css/style.css", &b"body{margin:0}".repeat(20), Compression::Deflate)
            .expect("Operation should succeed");
        builder.build().expect("Operation should succeed")
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).expect("Operation should succeed");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn test_info() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let text = output(|out| info(&fs, out));
        assert!(text.contains("entries:    4"));
        assert!(text.contains("mapped:     false"));
        assert!(text.contains("raw"));
    }

    #[test]
    fn test_ls_recursive() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");

        let flat = output(|out| ls(&fs, "/", false, out));
        assert_eq!(flat.lines().count(), 2);

        let deep = output(|out| ls(&fs, "/", true, out));
        let paths: Vec<&str> = deep
            .lines()
            .map(|line| line.rsplit(' ').next().expect("path column"))
            .collect();
        assert_eq!(paths, vec!["index.html", "css", "css/style.css"]);
        assert!(deep.contains("deflate"));
    }

    #[test]
    fn test_stat_json() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let text = output(|out| stat(&fs, "/index.html", true, out));

        let value: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
        assert_eq!(value["path"], "index.html");
        assert_eq!(value["kind"], "file");
        assert_eq!(value["size"], 120);
        assert_eq!(value["compressed_size"], 120);
        assert_eq!(value["codec"], "none");
    }

    #[test]
    fn test_stat_text_directory() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let text = output(|out| stat(&fs, "css", false, out));
        assert!(text.contains("kind:            directory"));
        assert!(text.contains("children:        1"));
    }

    #[test]
    fn test_cat_decoded_and_raw() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");

        let decoded = output(|out| cat(&fs, "css/style.css", false, out));
        assert_eq!(decoded, "body{margin:0}".repeat(20));

        let mut raw = Vec::new();
        cat(&fs, "css/style.css", true, &mut raw).expect("Operation should succeed");
        let entry = fs.resolve("css/style.css").expect("Operation should succeed");
        assert_eq!(raw.len() as u32, entry.stat().compressed_size);
        assert_eq!(&raw[..1], &[0x78]);
    }

    #[test]
    fn test_missing_path_has_context() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let err = cat(&fs, "nope", false, &mut Vec::new()).expect_err("missing file");
        assert!(format!("{err:#}").contains("cannot open nope"));
    }
}
