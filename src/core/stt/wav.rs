//! WAV container helpers for vendors that expect a file rather than raw PCM.

use std::io::Cursor;

use super::base::STTError;

/// Wrap raw PCM16 little-endian mono samples in a WAV container.
pub fn create_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, STTError> {
    if pcm_data.len() % 2 != 0 {
        return Err(STTError::AudioProcessingError(format!(
            "PCM16 buffer has odd length {}",
            pcm_data.len()
        )));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm_data.len()));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| STTError::AudioProcessingError(format!("WAV header: {e}")))?;
        let mut samples = writer.get_i16_writer(pcm_data.len() as u32 / 2);
        for pair in pcm_data.chunks_exact(2) {
            samples.write_sample(i16::from_le_bytes([pair[0], pair[1]]));
        }
        samples
            .flush()
            .map_err(|e| STTError::AudioProcessingError(format!("WAV samples: {e}")))?;
        writer
            .finalize()
            .map_err(|e| STTError::AudioProcessingError(format!("WAV finalize: {e}")))?;
    }

    Ok(cursor.into_inner())
}
