//! RIFF/WAVE (16-bit PCM) encoding and decoding.
//!
//! ```text
//! offset  size  field
//!      0     4  "RIFF"
//!      4     4  36 + data length
//!      8     4  "WAVE"
//!     12     4  "fmt "
//!     16     4  16 (fmt chunk length)
//!     20     2  1 (PCM)
//!     22     2  channels
//!     24     4  sample rate
//!     28     4  byte rate = sample rate × channels × 2
//!     32     2  block align = channels × 2
//!     34     2  16 (bits per sample)
//!     36     4  "data"
//!     40     4  data length
//!     44     …  interleaved i16 samples, frame by frame
//! ```
//!
//! All fields are little-endian.

use std::{
    io::{Cursor, Read},
    ops::Range,
};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use crate::{
    buffer::AudioBuffer,
    error::{EngineError, Result},
    io::converter::{f32_to_i16, i16_to_f32},
};

pub const HEADER_LEN: usize = 44;
const PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Header problems are plain reasons; [`decode_wav`] attaches the file name.
type HeaderResult<T> = std::result::Result<T, String>;

/// The format fields of a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Frames in the data chunk.
    pub frames: usize,
}

/// Serialize `buffer` as a canonical 44-byte-header WAV file.
///
/// Fails when the data does not fit the 32-bit RIFF size fields.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let channels = buffer.num_channels();
    let frames = buffer.frames();
    let sizes = RiffSizes::new(frames, channels, buffer.sample_rate())?;
    let mut out = vec![0u8; HEADER_LEN + sizes.data_len as usize];

    write_header(&mut out[..HEADER_LEN], &sizes);

    let mut pos = HEADER_LEN;
    for frame in 0..frames {
        for channel in buffer.channels() {
            LittleEndian::write_i16(&mut out[pos..pos + 2], f32_to_i16(channel[frame]));
            pos += 2;
        }
    }
    Ok(out)
}

/// The size-dependent header fields, checked against their widths.
#[derive(Debug)]
struct RiffSizes {
    channels: u16,
    sample_rate: u32,
    block_align: u16,
    byte_rate: u32,
    data_len: u32,
}

impl RiffSizes {
    fn new(frames: usize, channels: usize, sample_rate: u32) -> Result<Self> {
        let too_large = || {
            EngineError::InvalidBuffer(format!(
                "{frames} frames × {channels} channels at {sample_rate} Hz does not fit a WAV file"
            ))
        };
        let channels = u16::try_from(channels).map_err(|_| too_large())?;
        let block_align = channels.checked_mul(2).ok_or_else(too_large)?;
        let byte_rate = sample_rate
            .checked_mul(block_align as u32)
            .ok_or_else(too_large)?;
        let data_len = frames
            .checked_mul(block_align as usize)
            .and_then(|len| u32::try_from(len).ok())
            .filter(|len| len.checked_add(36).is_some())
            .ok_or_else(too_large)?;
        Ok(Self {
            channels,
            sample_rate,
            block_align,
            byte_rate,
            data_len,
        })
    }
}

fn write_header(header: &mut [u8], sizes: &RiffSizes) {
    header[0..4].copy_from_slice(b"RIFF");
    LittleEndian::write_u32(&mut header[4..8], 36 + sizes.data_len);
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    LittleEndian::write_u32(&mut header[16..20], 16);
    LittleEndian::write_u16(&mut header[20..22], PCM);
    LittleEndian::write_u16(&mut header[22..24], sizes.channels);
    LittleEndian::write_u32(&mut header[24..28], sizes.sample_rate);
    LittleEndian::write_u32(&mut header[28..32], sizes.byte_rate);
    LittleEndian::write_u16(&mut header[32..34], sizes.block_align);
    LittleEndian::write_u16(&mut header[34..36], BITS_PER_SAMPLE);
    header[36..40].copy_from_slice(b"data");
    LittleEndian::write_u32(&mut header[40..44], sizes.data_len);
}

/// Parse the header, skipping any chunks other than `fmt ` and `data`.
///
/// Returns the format and the byte range of the sample data.
pub fn read_header(bytes: &[u8]) -> HeaderResult<(WavSpec, Range<usize>)> {
    let mut cursor = Cursor::new(bytes);
    let mut tag = [0u8; 4];

    read_tag(&mut cursor, &mut tag)?;
    if &tag != b"RIFF" {
        return Err("missing RIFF tag".into());
    }
    cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
    read_tag(&mut cursor, &mut tag)?;
    if &tag != b"WAVE" {
        return Err("missing WAVE tag".into());
    }

    let mut format: Option<(u16, u32, u16)> = None;
    loop {
        read_tag(&mut cursor, &mut tag).map_err(|_| "no data chunk".to_string())?;
        let len = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())? as usize;
        let start = cursor.position() as usize;

        match &tag {
            b"fmt " => {
                if len < 16 {
                    return Err(format!("fmt chunk too short ({len} bytes)"));
                }
                let audio_format = cursor.read_u16::<LittleEndian>().map_err(|e| e.to_string())?;
                let channels = cursor.read_u16::<LittleEndian>().map_err(|e| e.to_string())?;
                let sample_rate = cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
                if audio_format != PCM {
                    return Err(format!("unsupported format tag {audio_format}"));
                }
                // byte rate, block align
                cursor.read_u32::<LittleEndian>().map_err(|e| e.to_string())?;
                cursor.read_u16::<LittleEndian>().map_err(|e| e.to_string())?;
                let bits = cursor.read_u16::<LittleEndian>().map_err(|e| e.to_string())?;
                format = Some((channels, sample_rate, bits));
            }
            b"data" => {
                let (channels, sample_rate, bits_per_sample) =
                    format.ok_or_else(|| "data chunk before fmt chunk".to_string())?;
                if channels == 0 {
                    return Err("zero channels".into());
                }
                let end = (start + len).min(bytes.len());
                let frame_bytes = channels as usize * (bits_per_sample as usize / 8).max(1);
                let spec = WavSpec {
                    channels,
                    sample_rate,
                    bits_per_sample,
                    frames: (end - start) / frame_bytes,
                };
                return Ok((spec, start..end));
            }
            _ => {}
        }
        // Chunks are word aligned
        let next = start + len + (len & 1);
        if next > bytes.len() {
            return Err("truncated chunk".into());
        }
        cursor.set_position(next as u64);
    }
}

fn read_tag(cursor: &mut Cursor<&[u8]>, tag: &mut [u8; 4]) -> HeaderResult<()> {
    cursor.read_exact(tag).map_err(|e| e.to_string())
}

/// Decode a 16-bit PCM WAV file into a planar buffer.
///
/// `name` only labels the error.
pub fn decode_wav(name: &str, bytes: &[u8]) -> Result<AudioBuffer> {
    let (spec, data) = read_header(bytes).map_err(|reason| EngineError::decode(name, reason))?;
    if spec.bits_per_sample != BITS_PER_SAMPLE {
        return Err(EngineError::decode(
            name,
            format!("unsupported bit depth {}", spec.bits_per_sample),
        ));
    }
    if spec.sample_rate == 0 {
        return Err(EngineError::decode(name, "sample rate is zero"));
    }

    let channels = spec.channels as usize;
    let mut planar = vec![Vec::with_capacity(spec.frames); channels];
    let samples = &bytes[data];
    for frame in samples.chunks_exact(channels * 2) {
        for (channel, raw) in planar.iter_mut().zip(frame.chunks_exact(2)) {
            channel.push(i16_to_f32(LittleEndian::read_i16(raw)));
        }
    }
    AudioBuffer::from_channels(planar, spec.sample_rate)
        .map_err(|e| EngineError::decode(name, e.to_string()))
}
