use crate::audio::SampleBuffer;
use crate::error::EncodeError;

/// RIFF header plus `fmt ` and `data` chunk headers
pub const HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: u64 = 2;

/// Encode as 16-bit PCM WAV, frame-major with channels interleaved
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>, EncodeError> {
    let header = wav_header(buffer.channel_count(), buffer.frame_count(), buffer.sample_rate())?;

    let data_len = buffer.frame_count() * buffer.channel_count() * BYTES_PER_SAMPLE as usize;
    let mut out = Vec::with_capacity(HEADER_LEN + data_len);
    out.extend_from_slice(&header);

    let channels = buffer.channels();
    for frame in 0..buffer.frame_count() {
        for channel in channels {
            out.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
    }

    Ok(out)
}

/// Hard-clip to [-1, 1], scale asymmetrically and truncate toward zero
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

fn wav_header(channels: usize, frames: usize, sample_rate: u32) -> Result<[u8; HEADER_LEN], EncodeError> {
    let data_size = (frames as u64)
        .saturating_mul(channels as u64)
        .saturating_mul(BYTES_PER_SAMPLE);
    let byte_rate = (sample_rate as u64).saturating_mul(channels as u64) * BYTES_PER_SAMPLE;
    let block_align = (channels as u64).saturating_mul(BYTES_PER_SAMPLE);

    let too_large = data_size.saturating_add(36) > u32::MAX as u64
        || byte_rate > u32::MAX as u64
        || block_align > u16::MAX as u64;
    if too_large {
        return Err(EncodeError::TooLarge(data_size));
    }

    let mut header = [0u8; HEADER_LEN];
    let fields: [&[u8]; 13] = [
        b"RIFF",
        &(36 + data_size as u32).to_le_bytes(),
        b"WAVE",
        b"fmt ",
        &16u32.to_le_bytes(),
        &1u16.to_le_bytes(),
        &(channels as u16).to_le_bytes(),
        &sample_rate.to_le_bytes(),
        &(byte_rate as u32).to_le_bytes(),
        &(block_align as u16).to_le_bytes(),
        &16u16.to_le_bytes(),
        b"data",
        &(data_size as u32).to_le_bytes(),
    ];

    let mut offset = 0;
    for field in fields {
        header[offset..offset + field.len()].copy_from_slice(field);
        offset += field.len();
    }

    Ok(header)
}
