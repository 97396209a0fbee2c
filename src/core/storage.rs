//! Chunked, LZ4-compressed dataset archive.
//!
//! Layout:
//! - magic: `PCSIMDS1`
//! - version: u32
//! - chunks, each `tag: [u8;4] | len: u32 | uncompressed_len: u32 | lz4 block`
//!
//! `TIME`, `POS_` and `VEL_` hold little-endian `f64` arrays; `META` holds the
//! JSON-encoded [`TrajectoryMeta`]. Unknown chunks are skipped on load.

use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::SimResult;
use crate::trajectory::{Trajectory, TrajectoryMeta};

pub const MAGIC: &[u8; 8] = b"PCSIMDS1";
pub const VERSION_V1: u32 = 1;
pub const VERSION_CURRENT: u32 = VERSION_V1;

const TAG_TIME: [u8; 4] = *b"TIME";
const TAG_POS: [u8; 4] = *b"POS_";
const TAG_VEL: [u8; 4] = *b"VEL_";
const TAG_META: [u8; 4] = *b"META";

pub fn compress_lz4(input: &[u8]) -> Vec<u8> {
    lz4_flex::compress(input)
}

pub fn decompress_lz4(input: &[u8], expected_size: usize) -> io::Result<Vec<u8>> {
    // Strict format: raw LZ4 block with external expected size.
    lz4_flex::decompress(input, expected_size)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "lz4 decompression failed"))
}

pub fn write_u32_le<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn read_exact<const N: usize, R: Read>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    Ok(u32::from_le_bytes(read_exact::<4, _>(r)?))
}

pub fn f64s_to_le_bytes(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn f64s_from_le_bytes(bytes: &[u8]) -> io::Result<Vec<f64>> {
    if bytes.len() % 8 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "f64 array chunk length is not a multiple of 8",
        ));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            f64::from_le_bytes(b)
        })
        .collect())
}

/// Write a chunk whose payload is LZ4-compressed and preceded by the uncompressed length.
pub fn write_chunk_lz4<W: Write>(w: &mut W, tag: [u8; 4], payload: &[u8]) -> io::Result<()> {
    let compressed = compress_lz4(payload);
    let uncompressed_len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "chunk too large"))?;
    let total_len = 4u32.saturating_add(
        u32::try_from(compressed.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "chunk too large"))?,
    );

    w.write_all(&tag)?;
    write_u32_le(w, total_len)?;
    write_u32_le(w, uncompressed_len)?;
    w.write_all(&compressed)
}

/// Read the next chunk tag and length.
///
/// Returns `Ok(None)` only when the stream ends before the first tag byte; a
/// header cut off part way is an `UnexpectedEof` error.
pub fn read_chunk_header<R: Read>(r: &mut R) -> io::Result<Option<([u8; 4], u32)>> {
    let mut tag = [0u8; 4];
    let mut filled = 0;
    while filled < tag.len() {
        match r.read(&mut tag[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some((tag, read_u32_le(r)?))),
        _ => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated dataset chunk header",
        )),
    }
}

fn read_chunk_body_lz4<R: Read>(r: &mut R, len: u32) -> io::Result<Vec<u8>> {
    let mut take = r.take(len as u64);
    let uncompressed_len = read_u32_le(&mut take)? as usize;
    let mut compressed = Vec::with_capacity((len as usize).saturating_sub(4));
    take.read_to_end(&mut compressed)?;
    if compressed.len() + 4 != len as usize {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated dataset chunk",
        ));
    }
    decompress_lz4(&compressed, uncompressed_len)
}

pub fn write_dataset_to<W: Write>(w: &mut W, traj: &Trajectory) -> SimResult<()> {
    w.write_all(MAGIC)?;
    write_u32_le(w, VERSION_CURRENT)?;

    write_chunk_lz4(w, TAG_TIME, &f64s_to_le_bytes(&traj.time))?;
    write_chunk_lz4(w, TAG_POS, &f64s_to_le_bytes(&traj.pos))?;
    write_chunk_lz4(w, TAG_VEL, &f64s_to_le_bytes(&traj.vel))?;

    let meta = serde_json::to_vec(&traj.meta)?;
    write_chunk_lz4(w, TAG_META, &meta)?;
    Ok(())
}

pub fn read_dataset_from<R: Read>(r: &mut R) -> SimResult<Trajectory> {
    let magic = read_exact::<8, _>(r)?;
    if &magic != MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "bad dataset magic").into());
    }

    let version = read_u32_le(r)?;
    if version != VERSION_CURRENT {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "unsupported dataset version",
        )
        .into());
    }

    let mut time: Option<Vec<f64>> = None;
    let mut pos: Option<Vec<f64>> = None;
    let mut vel: Option<Vec<f64>> = None;
    let mut meta: Option<TrajectoryMeta> = None;

    loop {
        let Some((tag, len)) = read_chunk_header(r)? else {
            break;
        };

        let buf = read_chunk_body_lz4(r, len)?;
        match tag {
            TAG_TIME => time = Some(f64s_from_le_bytes(&buf)?),
            TAG_POS => pos = Some(f64s_from_le_bytes(&buf)?),
            TAG_VEL => vel = Some(f64s_from_le_bytes(&buf)?),
            TAG_META => meta = Some(serde_json::from_slice(&buf)?),
            _ => tracing::debug!(tag = ?tag, "skipping unknown dataset chunk"),
        }
    }

    let missing = |name: &str| io::Error::new(io::ErrorKind::InvalidData, format!("missing {name} chunk"));
    let time = time.ok_or_else(|| missing("time"))?;
    let pos = pos.ok_or_else(|| missing("position"))?;
    let vel = vel.ok_or_else(|| missing("velocity"))?;
    let meta = meta.ok_or_else(|| missing("meta"))?;

    if time.len() != pos.len() || time.len() != vel.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "dataset arrays have different lengths",
        )
        .into());
    }

    Ok(Trajectory {
        time,
        pos,
        vel,
        meta,
    })
}

/// Save a trajectory to `path`, creating parent directories as needed.
pub fn save_dataset(path: impl AsRef<Path>, traj: &Trajectory) -> SimResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut w = BufWriter::new(fs::File::create(path)?);
    write_dataset_to(&mut w, traj)?;
    w.flush()?;
    tracing::info!(path = %path.display(), samples = traj.len(), "saved dataset");
    Ok(())
}

pub fn load_dataset(path: impl AsRef<Path>) -> SimResult<Trajectory> {
    let mut r = BufReader::new(fs::File::open(path.as_ref())?);
    read_dataset_from(&mut r)
}
