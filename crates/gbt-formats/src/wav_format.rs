//! WAV encoding for bounced songs (16-bit stereo) and single notes (8-bit mono).

use gbt_engine::Frame;
use std::io::Write;

/// Write mixed frames as 16-bit stereo PCM.
pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let num_channels: u16 = 2;
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let data_size = frames.len() as u32 * block_align as u32;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, num_channels, sample_rate, block_align, bits_per_sample)?;
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        w.write_all(&frame.left.to_le_bytes())?;
        w.write_all(&frame.right.to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + frames.len() * 4);
    // Writing into a Vec cannot fail.
    let _ = write_wav(&mut buf, frames, sample_rate);
    buf
}

/// Write one rendered note buffer as 8-bit mono PCM.
///
/// WAV stores 8-bit samples unsigned, centred on 128.
pub fn write_note_wav(w: &mut impl Write, samples: &[i8], sample_rate: u32) -> std::io::Result<()> {
    let data_size = samples.len() as u32;
    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, 1, sample_rate, 1, 8)?;
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    let bytes: Vec<u8> = samples.iter().map(|&s| (s as i16 + 128) as u8).collect();
    w.write_all(&bytes)?;
    if data_size % 2 != 0 {
        // RIFF chunks are word aligned
        w.write_all(&[0])?;
    }
    Ok(())
}

pub fn note_to_wav(samples: &[i8], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(45 + samples.len());
    let _ = write_note_wav(&mut buf, samples, sample_rate);
    buf
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size + data_size % 2).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(
    w: &mut impl Write,
    num_channels: u16,
    sample_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())
}
