//! WAV implementation of the codec seam, backed by hound.

use std::io::ErrorKind;
use std::path::Path;

use super::{DecodedAudio, EncodeRequest, FileError, HeaderFormat, SampleFormat, SampleFileCodec};

/// WAV decode/encode via hound. Stateless; share one value freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

const I24_MAX: f32 = 8_388_607.0;

impl SampleFileCodec for WavCodec {
    fn read(
        &self,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
    ) -> Result<DecodedAudio, FileError> {
        let mut reader = hound::WavReader::open(path).map_err(|err| open_error(path, err))?;
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(FileError::UnsupportedFormat {
                details: format!("{} has zero channels", path.display()),
            });
        }

        let total_frames = reader.duration() as usize;
        let available = total_frames.saturating_sub(start_frame);
        let want = frames.unwrap_or(available);
        if start_frame > total_frames || want > available {
            return Err(FileError::TruncatedData {
                details: format!(
                    "requested frames [{}, {}) but {} has {} frames",
                    start_frame,
                    start_frame + want,
                    path.display(),
                    total_frames
                ),
            });
        }

        reader
            .seek(start_frame as u32)
            .map_err(|err| FileError::Io {
                details: format!("seek in {}: {}", path.display(), err),
            })?;

        let channels = spec.channels as usize;
        let samples = decode_samples(&mut reader, path, want * channels)?;
        Ok(DecodedAudio {
            samples,
            channels,
            sample_rate: spec.sample_rate,
        })
    }

    fn read_channels(
        &self,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
        channels: &[usize],
    ) -> Result<DecodedAudio, FileError> {
        let full = self.read(path, start_frame, frames)?;
        for &channel in channels {
            if channel >= full.channels {
                return Err(FileError::UnsupportedFormat {
                    details: format!(
                        "channel {} out of range for {}-channel file {}",
                        channel,
                        full.channels,
                        path.display()
                    ),
                });
            }
        }

        let frame_count = full.frame_count();
        let mut samples = Vec::with_capacity(frame_count * channels.len());
        for frame in 0..frame_count {
            let base = frame * full.channels;
            for &channel in channels {
                samples.push(full.samples[base + channel]);
            }
        }

        Ok(DecodedAudio {
            samples,
            channels: channels.len(),
            sample_rate: full.sample_rate,
        })
    }

    fn write(&self, path: &Path, request: &EncodeRequest<'_>) -> Result<(), FileError> {
        let HeaderFormat::Wav = request.header_format;
        if request.channels == 0 || request.channels > u16::MAX as usize {
            return Err(FileError::UnsupportedFormat {
                details: format!("cannot write {}-channel file", request.channels),
            });
        }
        debug_assert_eq!(request.samples.len() % request.channels, 0);

        let spec = hound::WavSpec {
            channels: request.channels as u16,
            sample_rate: request.sample_rate,
            bits_per_sample: request.sample_format.bits_per_sample(),
            sample_format: match request.sample_format {
                SampleFormat::Float32 => hound::SampleFormat::Float,
                _ => hound::SampleFormat::Int,
            },
        };

        let mut writer =
            hound::WavWriter::create(path, spec).map_err(|err| encode_error(path, err))?;
        write_samples(&mut writer, request, path)?;
        writer.finalize().map_err(|err| encode_error(path, err))
    }
}

fn write_samples<W>(
    writer: &mut hound::WavWriter<W>,
    request: &EncodeRequest<'_>,
    path: &Path,
) -> Result<(), FileError>
where
    W: std::io::Write + std::io::Seek,
{
    match request.sample_format {
        SampleFormat::Float32 => {
            for &sample in request.samples {
                writer
                    .write_sample(sample)
                    .map_err(|err| encode_error(path, err))?;
            }
        }
        SampleFormat::Int16 => {
            for &sample in request.samples {
                let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                writer
                    .write_sample(quantized)
                    .map_err(|err| encode_error(path, err))?;
            }
        }
        SampleFormat::Int24 => {
            for &sample in request.samples {
                let quantized = (sample.clamp(-1.0, 1.0) * I24_MAX).round() as i32;
                writer
                    .write_sample(quantized)
                    .map_err(|err| encode_error(path, err))?;
            }
        }
        SampleFormat::Int32 => {
            for &sample in request.samples {
                let quantized =
                    (f64::from(sample.clamp(-1.0, 1.0)) * f64::from(i32::MAX)).round() as i32;
                writer
                    .write_sample(quantized)
                    .map_err(|err| encode_error(path, err))?;
            }
        }
    }
    Ok(())
}

fn decode_samples<R>(
    reader: &mut hound::WavReader<R>,
    path: &Path,
    count: usize,
) -> Result<Vec<f32>, FileError>
where
    R: std::io::Read,
{
    let spec = reader.spec();
    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .take(count)
            .map(|sample| sample.map_err(|err| read_error(path, err)))
            .collect::<Result<Vec<f32>, _>>()?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .take(count)
            .map(|sample| {
                sample
                    .map(|v| v as f32 / i16::MAX as f32)
                    .map_err(|err| read_error(path, err))
            })
            .collect::<Result<Vec<f32>, _>>()?,
        (hound::SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .take(count)
            .map(|sample| {
                sample
                    .map(|v| v as f32 / I24_MAX)
                    .map_err(|err| read_error(path, err))
            })
            .collect::<Result<Vec<f32>, _>>()?,
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .take(count)
            .map(|sample| {
                sample
                    .map(|v| v as f32 / i32::MAX as f32)
                    .map_err(|err| read_error(path, err))
            })
            .collect::<Result<Vec<f32>, _>>()?,
        (_, bits) => {
            return Err(FileError::UnsupportedFormat {
                details: format!(
                    "unsupported bits_per_sample={} for {}",
                    bits,
                    path.display()
                ),
            })
        }
    };

    if samples.len() < count {
        return Err(FileError::TruncatedData {
            details: format!(
                "{} ended after {} of {} samples",
                path.display(),
                samples.len(),
                count
            ),
        });
    }
    Ok(samples)
}

fn open_error(path: &Path, err: hound::Error) -> FileError {
    match err {
        hound::Error::IoError(io) if io.kind() == ErrorKind::NotFound => FileError::NotFound {
            path: path.display().to_string(),
        },
        hound::Error::IoError(io) => FileError::Io {
            details: format!("{}: {}", path.display(), io),
        },
        hound::Error::FormatError(msg) => FileError::UnsupportedFormat {
            details: format!("{}: {}", path.display(), msg),
        },
        hound::Error::UnfinishedSample => FileError::TruncatedData {
            details: format!("{} ends mid-sample", path.display()),
        },
        other => FileError::UnsupportedFormat {
            details: format!("{}: {}", path.display(), other),
        },
    }
}

fn read_error(path: &Path, err: hound::Error) -> FileError {
    match err {
        hound::Error::IoError(io) => FileError::Io {
            details: format!("{}: {}", path.display(), io),
        },
        hound::Error::UnfinishedSample => FileError::TruncatedData {
            details: format!("{} ends mid-sample", path.display()),
        },
        other => FileError::UnsupportedFormat {
            details: format!("{}: {}", path.display(), other),
        },
    }
}

fn encode_error(path: &Path, err: hound::Error) -> FileError {
    match err {
        hound::Error::IoError(io) => FileError::Io {
            details: format!("{}: {}", path.display(), io),
        },
        other => FileError::Encode {
            details: format!("{}: {}", path.display(), other),
        },
    }
}
