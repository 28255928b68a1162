//! Info, convert, and roundtrip-test commands built on the xgm crate.
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use comfy_table::{Table, presets::UTF8_FULL};
use flate2::read::GzDecoder;
use xgm::{Region, TranscodeOutput, VgmDocument, XgmDocument, transcode};

/// Read a file (or stdin for "-"), transparently decompressing gzip input
/// such as .vgz files.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    let bytes = if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
    };

    if bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B {
        let mut out = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut out)
            .context("failed to decompress gzip input")?;
        return Ok(out);
    }
    Ok(bytes)
}

fn is_xgm(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[0..4] == b"XGM "
}

fn region_name(region: Region) -> &'static str {
    match region {
        Region::Ntsc => "NTSC",
        Region::Pal => "PAL",
        Region::Unknown => "unknown (assuming NTSC)",
    }
}

fn report_diagnostics(out: &TranscodeOutput) {
    for diagnostic in &out.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
}

fn print_document(document: &XgmDocument) {
    let seconds = document.duration_seconds();
    println!("region:      {}", region_name(document.region));
    println!("frames:      {}", document.frame_count());
    println!("duration:    {}:{:02}", seconds / 60, seconds % 60);
    println!("music data:  {} bytes", document.music_data_size());
    println!("sample data: {} bytes", document.sample_data_size());
    if let Some(offset) = document.loop_command().and_then(|c| c.loop_offset()) {
        println!("loop offset: 0x{:X}", offset);
    }

    if !document.samples.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["#", "origin", "source len", "stored len"]);
        for sample in &document.samples {
            table.add_row(vec![
                sample.index.to_string(),
                format!("0x{:X}", sample.origin_addr),
                sample.origin_len.to_string(),
                sample.data_len().to_string(),
            ]);
        }
        println!("{table}");
    }
}

/// Show a summary for a VGM chip log or an XGM container.
pub fn info(path: &Path, bytes: Vec<u8>) -> Result<()> {
    if is_xgm(&bytes) {
        let document = XgmDocument::try_from(bytes.as_slice())?;
        println!("{}: XGM container", path.display());
        print_document(&document);
        return Ok(());
    }

    let vgm = VgmDocument::try_from(bytes.as_slice())?;
    println!(
        "{}: VGM v{:X}, rate {} Hz, {} commands",
        path.display(),
        vgm.version,
        vgm.rate,
        vgm.commands.len()
    );
    let out = transcode(&vgm)?;
    report_diagnostics(&out);
    print_document(&out.document);
    Ok(())
}

/// Compile a VGM chip log and write the resulting XGM container.
pub fn convert(path: &Path, output: Option<PathBuf>, bytes: Vec<u8>) -> Result<()> {
    let vgm = VgmDocument::try_from(bytes.as_slice())?;
    let out = transcode(&vgm)?;
    report_diagnostics(&out);

    let output = output.unwrap_or_else(|| path.with_extension("xgm"));
    let container = out.document.to_bytes();
    fs::write(&output, &container)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "{}: {} bytes ({} music bytes, {} sample bytes, {} samples)",
        output.display(),
        container.len(),
        out.document.music_data_size(),
        out.document.sample_data_size(),
        out.document.samples.len()
    );
    Ok(())
}

/// Serialize the document, parse it back, and verify nothing was lost.
///
/// VGM input is compiled first; XGM input is parsed as is. The comparison
/// covers the command stream, the sample table size, and the bytes of a
/// second serialization (the region flag is normalized on parse, so full
/// document equality is deliberately not required).
pub fn test_roundtrip(path: &Path, bytes: Vec<u8>, diag: bool) -> Result<()> {
    let document = if is_xgm(&bytes) {
        XgmDocument::try_from(bytes.as_slice())?
    } else {
        let vgm = VgmDocument::try_from(bytes.as_slice())?;
        let out = transcode(&vgm)?;
        report_diagnostics(&out);
        out.document
    };

    let serialized = document.to_bytes();
    let reparsed = XgmDocument::try_from(serialized.as_slice())?;

    let ok = reparsed.commands == document.commands
        && reparsed.samples.len() == document.samples.len()
        && reparsed.to_bytes() == serialized;
    if ok {
        println!("{}: roundtrip OK ({} bytes)", path.display(), serialized.len());
        return Ok(());
    }

    if diag {
        if reparsed.commands != document.commands {
            let mismatch = document
                .commands
                .iter()
                .zip(reparsed.commands.iter())
                .position(|(a, b)| a != b);
            eprintln!(
                "command streams differ: {} vs {} commands, first mismatch at {:?}",
                document.commands.len(),
                reparsed.commands.len(),
                mismatch
            );
        }
        if reparsed.samples.len() != document.samples.len() {
            eprintln!(
                "sample tables differ: {} vs {} samples",
                document.samples.len(),
                reparsed.samples.len()
            );
        }
    }
    bail!("{}: roundtrip mismatch", path.display());
}
