//! .Z80 snapshot parser for the 48K ZX Spectrum (v1, v2, v3 formats).
//!
//! **Version 1** (offset 6-7 PC != 0): 30-byte header + one 48K memory
//! block, optionally compressed.
//!
//! **Version 2/3** (offset 6-7 PC = 0): 30-byte base header + extended
//! header + page-based memory blocks. Only 48K hardware modes load.

pub use format_sna::{CpuState, RAM_SIZE, RAM_START, Result, Snapshot, SnapshotError};
use tracing::debug;

/// Base header size, shared by every version.
pub const BASE_HEADER_SIZE: usize = 30;

/// Size of one memory page.
const PAGE_SIZE: usize = 0x4000;

/// Block length marking an uncompressed 16K page.
const UNCOMPRESSED: u16 = 0xFFFF;

/// Trailer after a compressed v1 memory image.
const V1_END_MARKER: [u8; 4] = [0x00, 0xED, 0xED, 0x00];

fn word(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Parse a .Z80 snapshot, detecting the version from the header.
///
/// # Errors
///
/// Returns an error if the data is truncated, the extended header length
/// is unknown, the hardware isn't a 48K machine, or a compressed block
/// doesn't decode to exactly its page.
pub fn parse(data: &[u8]) -> Result<Snapshot> {
    if data.len() < BASE_HEADER_SIZE {
        return Err(SnapshotError::Truncated {
            needed: BASE_HEADER_SIZE,
            actual: data.len(),
        });
    }

    let (mut cpu, flags) = parse_base_header(data);
    let border = (flags >> 1) & 0x07;

    let mut ram = vec![0u8; RAM_SIZE];
    if cpu.pc == 0 {
        cpu.pc = parse_extended(data, &mut ram)?;
    } else {
        debug!("Z80 v1 snapshot");
        let body = &data[BASE_HEADER_SIZE..];
        if flags & 0x20 != 0 {
            let body = body.strip_suffix(&V1_END_MARKER).unwrap_or(body);
            decompress_into(body, &mut ram, RAM_START)?;
        } else if body.len() < RAM_SIZE {
            return Err(SnapshotError::Truncated {
                needed: BASE_HEADER_SIZE + RAM_SIZE,
                actual: data.len(),
            });
        } else {
            ram.copy_from_slice(&body[..RAM_SIZE]);
        }
    }

    debug!(pc = cpu.pc, sp = cpu.sp, border, "parsed Z80 snapshot");
    Ok(Snapshot { cpu, border, ram })
}

/// Decode the 30-byte base header. Returns the state and the normalised
/// flags byte (offset 12).
fn parse_base_header(data: &[u8]) -> (CpuState, u8) {
    // Older files wrote 255 here; it means 1.
    let flags = if data[12] == 255 { 1 } else { data[12] };

    let cpu = CpuState {
        af: u16::from_be_bytes([data[0], data[1]]),
        bc: word(data, 2),
        hl: word(data, 4),
        pc: word(data, 6),
        sp: word(data, 8),
        i: data[10],
        r: (data[11] & 0x7F) | ((flags & 0x01) << 7),
        de: word(data, 13),
        bc_alt: word(data, 15),
        de_alt: word(data, 17),
        hl_alt: word(data, 19),
        af_alt: u16::from_be_bytes([data[21], data[22]]),
        iy: word(data, 23),
        ix: word(data, 25),
        iff1: data[27] != 0,
        iff2: data[28] != 0,
        im: (data[29] & 0x03).min(2),
    };
    (cpu, flags)
}

/// Decode a v2/v3 extended header and its memory pages. Returns PC.
fn parse_extended(data: &[u8], ram: &mut [u8]) -> Result<u16> {
    const LENGTH_END: usize = BASE_HEADER_SIZE + 2;
    if data.len() < LENGTH_END {
        return Err(SnapshotError::Truncated {
            needed: LENGTH_END,
            actual: data.len(),
        });
    }

    let ext_len = word(data, BASE_HEADER_SIZE);
    let version = match ext_len {
        23 => 2,
        54 | 55 => 3,
        other => return Err(SnapshotError::UnknownHeaderLength(other)),
    };
    let header_end = LENGTH_END + usize::from(ext_len);
    if data.len() < header_end {
        return Err(SnapshotError::Truncated {
            needed: header_end,
            actual: data.len(),
        });
    }

    let pc = word(data, 32);
    let mode = data[34];
    let is_48k = match version {
        2 => matches!(mode, 0 | 1),
        _ => matches!(mode, 0 | 1 | 3),
    };
    if !is_48k {
        return Err(SnapshotError::UnsupportedHardware { version, mode });
    }
    debug!(version, mode, "Z80 extended snapshot");

    let mut pos = header_end;
    while pos + 3 <= data.len() {
        let length = word(data, pos);
        let page = data[pos + 2];
        pos += 3;

        let stored = if length == UNCOMPRESSED {
            PAGE_SIZE
        } else {
            usize::from(length)
        };
        if pos + stored > data.len() {
            return Err(SnapshotError::Truncated {
                needed: pos + stored,
                actual: data.len(),
            });
        }
        let block = &data[pos..pos + stored];
        pos += stored;

        let Some(address) = page_address(page) else {
            debug!(page, "skipping page");
            continue;
        };
        let offset = usize::from(address - RAM_START);
        let target = &mut ram[offset..offset + PAGE_SIZE];
        if length == UNCOMPRESSED {
            target.copy_from_slice(block);
        } else {
            decompress_into(block, target, address)?;
        }
    }

    Ok(pc)
}

/// Where a 48K page lands in the address space.
fn page_address(page: u8) -> Option<u16> {
    match page {
        4 => Some(0x8000),
        5 => Some(0xC000),
        8 => Some(0x4000),
        _ => None,
    }
}

/// Decompress into `dst`, which must be filled exactly. `address` only
/// labels errors.
fn decompress_into(src: &[u8], dst: &mut [u8], address: u16) -> Result<()> {
    let written =
        decompress(src, dst).map_err(|reason| SnapshotError::CorruptBlock { address, reason })?;
    if written == dst.len() {
        Ok(())
    } else {
        Err(SnapshotError::CorruptBlock {
            address,
            reason: "block decodes short of its page",
        })
    }
}

/// Expand .Z80 run-length encoding into `dst`.
///
/// `ED ED n b` is `n` copies of `b`; every other byte, a lone ED
/// included, is literal. Returns the number of bytes written.
///
/// # Errors
///
/// Fails if the output would overrun `dst` or a run is cut short.
pub fn decompress(src: &[u8], dst: &mut [u8]) -> std::result::Result<usize, &'static str> {
    let mut si = 0;
    let mut di = 0;

    while si < src.len() {
        let (count, value, used) = match src[si..] {
            [0xED, 0xED, count, value, ..] => (usize::from(count), value, 4),
            [0xED, 0xED, ..] => return Err("run cut short"),
            [value, ..] => (1, value, 1),
            [] => break,
        };
        let end = di + count;
        if end > dst.len() {
            return Err("output overruns page");
        }
        dst[di..end].fill(value);
        di = end;
        si += used;
    }

    Ok(di)
}
